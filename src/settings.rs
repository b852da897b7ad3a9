use std::{io, path::Path};

use serde_derive::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::install::DEFAULT_CONCURRENCY;

/// Launcher settings persisted as JSON next to the launcher.
///
/// Missing fields take their defaults so older files keep loading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherSettings {
    pub version: String,
    pub nick_name: String,
    pub game_dir: String,
    pub minecraft_version: String,
    pub loader: String,
    pub loader_version: Option<String>,
    pub java: String,
    pub concurrency: usize,
    /// Plain-text file holding the newest launcher version.
    pub update_url: Option<Url>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            nick_name: String::new(),
            game_dir: "minecraft".to_owned(),
            minecraft_version: "1.20.1".to_owned(),
            loader: "fabric".to_owned(),
            loader_version: None,
            java: "java".to_owned(),
            concurrency: DEFAULT_CONCURRENCY,
            update_url: None,
        }
    }
}

impl LauncherSettings {
    /// Reads the settings file, writing the defaults first if there is none.
    #[instrument]
    pub async fn load_or_create(path: &Path) -> crate::Result<Self> {
        match fs::read(path).await {
            Ok(filebuf) => Ok(serde_json::from_slice(&filebuf)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save(path).await?;
                info!(?path, "Default settings written");
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }

    /// Terms an installed version id must contain to be launched.
    pub fn version_filter(&self) -> Vec<&str> {
        [self.loader.as_str(), self.minecraft_version.as_str()]
            .into_iter()
            .filter(|term| !term.is_empty())
            .collect()
    }
}
