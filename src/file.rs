use std::path::{Path, PathBuf};

use tokio::fs;

/// Layout of a game directory.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub gamedir: PathBuf,
    pub assets_dir: PathBuf,
    pub libraries_dir: PathBuf,
    pub versions_dir: PathBuf,
}

impl Hierarchy {
    pub fn new(gamedir: impl Into<PathBuf>) -> Self {
        let gamedir = gamedir.into();
        Self {
            assets_dir: gamedir.join("assets"),
            libraries_dir: gamedir.join("libraries"),
            versions_dir: gamedir.join("versions"),
            gamedir,
        }
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir.join(id)
    }

    pub fn version_json(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.json"))
    }

    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.jar"))
    }

    pub fn natives_dir(&self, id: &str) -> PathBuf {
        self.version_dir(id).join("natives")
    }

    pub fn library(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.libraries_dir.join(relative)
    }

    pub fn asset_index(&self, assets_id: &str) -> PathBuf {
        self.assets_dir
            .join("indexes")
            .join(format!("{assets_id}.json"))
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.assets_dir.join("objects")
    }

    pub fn legacy_assets_dir(&self) -> PathBuf {
        self.assets_dir.join("virtual").join("legacy")
    }

    pub async fn ensure_directories(&self) -> crate::Result<()> {
        fs::create_dir_all(&self.assets_dir).await?;
        fs::create_dir_all(&self.libraries_dir).await?;
        fs::create_dir_all(&self.versions_dir).await?;
        Ok(())
    }
}
