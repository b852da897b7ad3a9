use std::collections::HashMap;

use serde_derive::{Deserialize, Serialize};

fn empty_hash() -> String {
    String::from("00null")
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AssetMetadata {
    #[serde(default = "empty_hash")]
    pub hash: String,
    pub size: u64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AssetIndex {
    pub map_to_resources: Option<bool>,
    #[serde(rename = "virtual")]
    pub is_virtual: Option<bool>,
    pub objects: HashMap<String, AssetMetadata>,
}

impl AssetMetadata {
    /// `ab/abcdef…`, the object path both on disk and on the resource server.
    pub fn hashed_id(&self) -> String {
        let prefix = self.hash.get(..2).unwrap_or(&self.hash);
        format!("{}/{}", prefix, self.hash)
    }
}

impl AssetIndex {
    pub fn is_legacy(&self) -> bool {
        self.map_to_resources.unwrap_or(false) || self.is_virtual.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_id_uses_two_char_prefix() {
        let meta = AssetMetadata {
            hash: "bdf48ef6b5d0d23bbb02e17d04865216179f510a".into(),
            size: 1,
        };
        assert_eq!(
            meta.hashed_id(),
            "bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a"
        );
    }

    #[test]
    fn short_hash_does_not_panic() {
        let meta = AssetMetadata {
            hash: "a".into(),
            size: 1,
        };
        assert_eq!(meta.hashed_id(), "a/a");
    }

    #[test]
    fn parses_index_and_detects_legacy() {
        let index: AssetIndex = serde_json::from_str(
            r#"{"map_to_resources": true, "objects": {"icons/icon_16x16.png": {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665}}}"#,
        )
        .unwrap();
        assert!(index.is_legacy());
        assert_eq!(index.objects["icons/icon_16x16.png"].size, 3665);

        let index: AssetIndex = serde_json::from_str(r#"{"objects": {}}"#).unwrap();
        assert!(!index.is_legacy());
    }
}
