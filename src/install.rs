use std::collections::HashSet;

use reqwest::Client;
use tokio::{fs, sync::OnceCell};
use tracing::{info, instrument};

use crate::{
    download::Manager,
    file::Hierarchy,
    metadata::{
        assets::AssetIndex,
        game::VersionInfo,
        manifest::{self, VersionsManifest},
    },
    progress::InstallCallback,
    resources::{fetch_bytes, fetch_manifest, Endpoints},
    sync::Repository,
    versions::{load_version, read_version},
};

pub const DEFAULT_CONCURRENCY: usize = 16;

/// Installs versions into a game directory.
pub struct Installer {
    client: Client,
    hierarchy: Hierarchy,
    endpoints: Endpoints,
    concurrency: usize,
    manifest: OnceCell<VersionsManifest>,
}

impl Installer {
    pub fn new(client: Client, hierarchy: Hierarchy, endpoints: Endpoints) -> Self {
        Self {
            client,
            hierarchy,
            endpoints,
            concurrency: DEFAULT_CONCURRENCY,
            manifest: OnceCell::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) async fn write_version_json(&self, id: &str, filebuf: &[u8]) -> crate::Result<()> {
        fs::create_dir_all(self.hierarchy.version_dir(id)).await?;
        fs::write(self.hierarchy.version_json(id), filebuf).await?;
        Ok(())
    }

    /// The version manifest, fetched at most once per installer.
    async fn manifest(&self) -> crate::Result<&VersionsManifest> {
        self.manifest
            .get_or_try_init(|| fetch_manifest(&self.client, &self.endpoints))
            .await
    }

    /// Turns `latest` or `latest-snapshot` into a concrete version id.
    ///
    /// Other ids are returned as given without touching the network.
    #[instrument(skip(self))]
    pub async fn resolve_version_id(&self, id: &str) -> crate::Result<String> {
        if !manifest::is_alias(id) {
            return Ok(id.to_owned());
        }
        let version = self
            .manifest()
            .await?
            .resolve(id)
            .ok_or_else(|| crate::Error::UnknownVersion(id.to_owned()))?;
        info!(alias = %id, id = %version.id, "Version alias resolved");
        Ok(version.id.clone())
    }

    /// Fetches the version JSON from the version manifest unless it is already on disk.
    #[instrument(skip(self))]
    async fn ensure_version_json(&self, id: &str) -> crate::Result<VersionInfo> {
        match read_version(&self.hierarchy, id).await {
            Err(crate::Error::UnknownVersion(_)) => {}
            other => return other,
        }
        let remote = self
            .manifest()
            .await?
            .get_version(id)
            .ok_or_else(|| crate::Error::UnknownVersion(id.to_owned()))?;
        let filebuf = fetch_bytes(&self.client, remote.url.clone()).await?;
        let info = serde_json::from_slice(&filebuf)?;
        self.write_version_json(id, &filebuf).await?;
        info!(%id, "Version json stored");
        Ok(info)
    }

    /// Installs `id` and everything it inherits from.
    ///
    /// Libraries, client jar and asset index are pulled as one phase, asset
    /// objects as a second one; each phase restarts the callback's count.
    #[instrument(skip(self, callback))]
    pub async fn install_minecraft_version(
        &self,
        id: &str,
        callback: &mut dyn InstallCallback,
    ) -> crate::Result<()> {
        let mut next = Some(id.to_owned());
        let mut seen = HashSet::new();
        while let Some(current) = next {
            if !seen.insert(current.clone()) {
                return Err(crate::Error::InheritanceCycle(current));
            }
            next = self.ensure_version_json(&current).await?.inherits_from;
        }
        let version = load_version(&self.hierarchy, id).await?;
        self.hierarchy.ensure_directories().await?;

        let mut repository = Repository::new(Manager::new(self.client.clone()));
        callback.on_status("Download Libraries")?;
        repository.track_libraries(&self.hierarchy, &version)?;
        repository.track_client(&self.hierarchy, &version);
        if let Some(asset_index) = &version.asset_index {
            repository.track_file(
                &asset_index.resource,
                self.hierarchy.asset_index(version.assets_id()),
            );
        }
        repository.pull_indices(self.concurrency, callback).await?;

        if version.asset_index.is_some() {
            callback.on_status("Download Assets")?;
            let filebuf = fs::read(self.hierarchy.asset_index(version.assets_id())).await?;
            let asset_index: AssetIndex = serde_json::from_slice(&filebuf)?;
            repository.purge();
            repository.track_asset_objects(&self.hierarchy, &self.endpoints, &asset_index)?;
            repository.pull_indices(self.concurrency, callback).await?;
        }

        info!(
            %id,
            downloaded_bytes = repository.downloader().downloaded_bytes(),
            "Version installed"
        );
        callback.on_status("Installation complete")?;
        Ok(())
    }
}
