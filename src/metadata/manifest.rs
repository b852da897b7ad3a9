use chrono::{DateTime, Utc};
use serde_derive::Deserialize;
use url::Url;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Release,
    Snapshot,
    OldAlpha,
    OldBeta,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub url: Url,
    pub release_time: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct Latest {
    pub release: String,
    pub snapshot: String,
}

/// Mojang's list of every published game version.
#[derive(Deserialize, Debug)]
pub struct VersionsManifest {
    pub latest: Latest,
    pub versions: Vec<Version>,
}

impl VersionsManifest {
    pub fn get_version(&self, id: &str) -> Option<&Version> {
        self.versions.iter().find(|version| version.id == id)
    }

    /// Like [`Self::get_version`], also accepting `latest` and `latest-snapshot`.
    pub fn resolve(&self, id: &str) -> Option<&Version> {
        match id {
            "latest" => self.get_version(&self.latest.release),
            "latest-snapshot" => self.get_version(&self.latest.snapshot),
            id => self.get_version(id),
        }
    }
}

pub fn is_alias(id: &str) -> bool {
    matches!(id, "latest" | "latest-snapshot")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "latest": {"release": "1.20.1", "snapshot": "23w31a"},
        "versions": [
            {"id": "23w31a", "type": "snapshot", "url": "https://example.com/23w31a.json",
             "time": "2023-08-01T12:00:00+00:00", "releaseTime": "2023-08-01T12:00:00+00:00"},
            {"id": "1.20.1", "type": "release", "url": "https://example.com/1.20.1.json",
             "time": "2023-06-12T12:00:00+00:00", "releaseTime": "2023-06-12T12:00:00+00:00"},
            {"id": "b1.7.3", "type": "old_beta", "url": "https://example.com/b1.7.3.json",
             "time": "2011-07-08T00:00:00+00:00", "releaseTime": "2011-07-08T00:00:00+00:00"}
        ]
    }"#;

    #[test]
    fn resolves_aliases() {
        let manifest: VersionsManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.resolve("latest").unwrap().id, "1.20.1");
        let snapshot = manifest.resolve("latest-snapshot").unwrap();
        assert_eq!(snapshot.release_type, ReleaseType::Snapshot);
        assert_eq!(snapshot.url.as_str(), "https://example.com/23w31a.json");
        assert_eq!(
            manifest.resolve("b1.7.3").unwrap().release_type,
            ReleaseType::OldBeta
        );
    }

    #[test]
    fn ids_match_exactly() {
        let manifest: VersionsManifest = serde_json::from_str(MANIFEST).unwrap();
        assert!(manifest.get_version("1.20.1").is_some());
        assert!(manifest.get_version("B1.7.3").is_none());
        assert!(manifest.get_version("latest").is_none());
        assert!(is_alias("latest") && !is_alias("1.20.1"));
    }
}
