use tracing::{info, instrument, warn};

use crate::{
    install::Installer,
    metadata::{fabric, game::VersionInfo},
    progress::InstallCallback,
    resources::{fetch_bytes, fetch_game_versions, fetch_loader_versions},
};

impl Installer {
    /// Installs the Fabric loader on top of `minecraft_version`.
    ///
    /// `minecraft_version` may be `latest` or `latest-snapshot`. Without an
    /// explicit `loader_version` the newest stable loader is used.
    /// Returns the id of the installed Fabric version.
    #[instrument(skip(self, callback))]
    pub async fn install_fabric(
        &self,
        minecraft_version: &str,
        loader_version: Option<&str>,
        callback: &mut dyn InstallCallback,
    ) -> crate::Result<String> {
        let minecraft_version = &self.resolve_version_id(minecraft_version).await?;
        let games = fetch_game_versions(self.client(), self.endpoints()).await?;
        if !fabric::is_supported(&games, minecraft_version) {
            return Err(crate::Error::UnsupportedVersion(
                minecraft_version.to_owned(),
            ));
        }
        let loader_version = match loader_version {
            Some(loader_version) => loader_version.to_owned(),
            None => {
                let loaders = fetch_loader_versions(self.client(), self.endpoints()).await?;
                fabric::latest_loader(&loaders)
                    .ok_or(crate::Error::NoLoaderVersion)?
                    .version
                    .clone()
            }
        };

        self.install_minecraft_version(minecraft_version, callback)
            .await?;

        callback.on_status(&format!("Installing Fabric {loader_version}"))?;
        let url = self
            .endpoints()
            .fabric_profile_url(minecraft_version, &loader_version)?;
        let filebuf = fetch_bytes(self.client(), url).await?;
        let profile: VersionInfo = serde_json::from_slice(&filebuf)?;
        let expected_id = fabric::version_id(&loader_version, minecraft_version);
        if profile.id != expected_id {
            warn!(%profile.id, %expected_id, "Fabric profile uses an unexpected id");
        }
        self.write_version_json(&profile.id, &filebuf).await?;
        info!(id = %profile.id, "Fabric profile stored");

        self.install_minecraft_version(&profile.id, callback)
            .await?;
        Ok(profile.id)
    }
}
