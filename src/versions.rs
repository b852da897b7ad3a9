use std::{collections::HashSet, io};

use tokio::fs;
use tracing::{debug, instrument};

use crate::{file::Hierarchy, metadata::game::VersionInfo};

/// A version present under `versions/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub id: String,
    pub release_type: Option<String>,
    pub inherits_from: Option<String>,
}

/// Every `versions/<id>/<id>.json` that parses, sorted by id.
#[instrument(skip(hierarchy))]
pub async fn installed_versions(hierarchy: &Hierarchy) -> crate::Result<Vec<InstalledVersion>> {
    let mut entries = match fs::read_dir(&hierarchy.versions_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };
    let mut versions = vec![];
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let Some(id) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        match read_version(hierarchy, &id).await {
            Ok(info) => versions.push(InstalledVersion {
                id,
                release_type: info.release_type,
                inherits_from: info.inherits_from,
            }),
            Err(err) => debug!(%id, %err, "Skipping version directory"),
        }
    }
    versions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(versions)
}

/// Last version whose id contains every term.
pub fn select_version<'a, S: AsRef<str>>(
    versions: &'a [InstalledVersion],
    terms: &[S],
) -> Option<&'a InstalledVersion> {
    versions
        .iter()
        .filter(|version| terms.iter().all(|term| version.id.contains(term.as_ref())))
        .last()
}

/// The version JSON exactly as stored, without resolving `inheritsFrom`.
pub async fn read_version(hierarchy: &Hierarchy, id: &str) -> crate::Result<VersionInfo> {
    let filebuf = match fs::read(hierarchy.version_json(id)).await {
        Ok(filebuf) => filebuf,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(crate::Error::UnknownVersion(id.to_owned()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&filebuf)?)
}

/// The version with its whole `inheritsFrom` chain folded in.
#[instrument(skip(hierarchy))]
pub async fn load_version(hierarchy: &Hierarchy, id: &str) -> crate::Result<VersionInfo> {
    let mut version = read_version(hierarchy, id).await?;
    let mut seen = HashSet::from([id.to_owned()]);
    while let Some(parent_id) = version.inherits_from.clone() {
        if !seen.insert(parent_id.clone()) {
            return Err(crate::Error::InheritanceCycle(parent_id));
        }
        debug!(%parent_id, "Inheriting");
        let parent = read_version(hierarchy, &parent_id).await?;
        version = version.inherit(parent);
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_version(hierarchy: &Hierarchy, id: &str, json: &str) {
        fs::create_dir_all(hierarchy.version_dir(id)).await.unwrap();
        fs::write(hierarchy.version_json(id), json).await.unwrap();
    }

    async fn sample() -> (tempfile::TempDir, Hierarchy) {
        let tmp = tempfile::TempDir::new().unwrap();
        let hierarchy = Hierarchy::new(tmp.path());
        write_version(
            &hierarchy,
            "1.20.1",
            r#"{"id": "1.20.1", "type": "release", "mainClass": "net.minecraft.client.main.Main"}"#,
        )
        .await;
        write_version(
            &hierarchy,
            "fabric-loader-0.14.21-1.20.1",
            r#"{"id": "fabric-loader-0.14.21-1.20.1", "inheritsFrom": "1.20.1", "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient"}"#,
        )
        .await;
        write_version(
            &hierarchy,
            "fabric-loader-0.16.5-1.20.1",
            r#"{"id": "fabric-loader-0.16.5-1.20.1", "inheritsFrom": "1.20.1", "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient"}"#,
        )
        .await;
        write_version(
            &hierarchy,
            "fabric-loader-0.16.5-1.19.4",
            r#"{"id": "fabric-loader-0.16.5-1.19.4", "inheritsFrom": "1.19.4", "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient"}"#,
        )
        .await;
        fs::create_dir_all(hierarchy.version_dir("broken"))
            .await
            .unwrap();
        (tmp, hierarchy)
    }

    #[tokio::test]
    async fn lists_parseable_versions_sorted() {
        let (_tmp, hierarchy) = sample().await;
        let ids: Vec<_> = installed_versions(&hierarchy)
            .await
            .unwrap()
            .into_iter()
            .map(|version| version.id)
            .collect();
        assert_eq!(
            ids,
            [
                "1.20.1",
                "fabric-loader-0.14.21-1.20.1",
                "fabric-loader-0.16.5-1.19.4",
                "fabric-loader-0.16.5-1.20.1"
            ]
        );
    }

    #[tokio::test]
    async fn empty_game_directory_has_no_versions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let hierarchy = Hierarchy::new(tmp.path().join("absent"));
        assert!(installed_versions(&hierarchy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn selects_last_match() {
        let (_tmp, hierarchy) = sample().await;
        let versions = installed_versions(&hierarchy).await.unwrap();
        let selected = select_version(&versions, &["fabric", "1.20.1"]).unwrap();
        assert_eq!(selected.id, "fabric-loader-0.16.5-1.20.1");
        assert!(select_version(&versions, &["forge"]).is_none());
    }

    #[tokio::test]
    async fn load_resolves_inheritance() {
        let (_tmp, hierarchy) = sample().await;
        let version = load_version(&hierarchy, "fabric-loader-0.16.5-1.20.1")
            .await
            .unwrap();
        assert_eq!(version.jar_id(), "1.20.1");
        assert_eq!(version.release_type.as_deref(), Some("release"));
    }

    #[tokio::test]
    async fn missing_parent_is_unknown_version() {
        let (_tmp, hierarchy) = sample().await;
        let err = load_version(&hierarchy, "fabric-loader-0.16.5-1.19.4")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::UnknownVersion(id) if id == "1.19.4"));
    }

    #[tokio::test]
    async fn inheritance_cycle_is_detected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let hierarchy = Hierarchy::new(tmp.path());
        write_version(&hierarchy, "a", r#"{"id": "a", "inheritsFrom": "b"}"#).await;
        write_version(&hierarchy, "b", r#"{"id": "b", "inheritsFrom": "a"}"#).await;
        let err = load_version(&hierarchy, "a").await.unwrap_err();
        assert!(matches!(err, crate::Error::InheritanceCycle(_)));
    }
}
