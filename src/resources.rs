use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::metadata::{
    assets::AssetMetadata,
    fabric::{GameVersion, LoaderVersion},
    manifest::VersionsManifest,
};

pub static VERSIONS_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";
pub static RESOURCE_REGISTRY_URL: &str = "https://resources.download.minecraft.net/";
pub static FABRIC_META_URL: &str = "https://meta.fabricmc.net/v2/";

/// Remote services the launcher talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub versions_manifest: Url,
    /// Base of the asset object store, ends with `/`.
    pub resources: Url,
    /// Base of the Fabric meta API, ends with `/`.
    pub fabric_meta: Url,
}

impl Endpoints {
    pub fn official() -> crate::Result<Self> {
        Ok(Self {
            versions_manifest: Url::parse(VERSIONS_MANIFEST_URL)?,
            resources: Url::parse(RESOURCE_REGISTRY_URL)?,
            fabric_meta: Url::parse(FABRIC_META_URL)?,
        })
    }

    pub fn asset_url(&self, asset_metadata: &AssetMetadata) -> crate::Result<Url> {
        Ok(self.resources.join(&asset_metadata.hashed_id())?)
    }

    pub fn fabric_loaders_url(&self) -> crate::Result<Url> {
        Ok(self.fabric_meta.join("versions/loader")?)
    }

    pub fn fabric_games_url(&self) -> crate::Result<Url> {
        Ok(self.fabric_meta.join("versions/game")?)
    }

    pub fn fabric_profile_url(
        &self,
        minecraft_version: &str,
        loader_version: &str,
    ) -> crate::Result<Url> {
        Ok(self.fabric_meta.join(&format!(
            "versions/loader/{minecraft_version}/{loader_version}/profile/json"
        ))?)
    }
}

/// Raw body of a successful response.
#[instrument(skip(client))]
pub async fn fetch_bytes(client: &Client, url: Url) -> crate::Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    debug!(?response, "Remote responded");
    Ok(response.bytes().await?.to_vec())
}

async fn fetch_json<T: DeserializeOwned>(client: &Client, url: Url) -> crate::Result<T> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?)
}

pub async fn fetch_manifest(
    client: &Client,
    endpoints: &Endpoints,
) -> crate::Result<VersionsManifest> {
    fetch_json(client, endpoints.versions_manifest.clone()).await
}

pub async fn fetch_loader_versions(
    client: &Client,
    endpoints: &Endpoints,
) -> crate::Result<Vec<LoaderVersion>> {
    fetch_json(client, endpoints.fabric_loaders_url()?).await
}

pub async fn fetch_game_versions(
    client: &Client,
    endpoints: &Endpoints,
) -> crate::Result<Vec<GameVersion>> {
    fetch_json(client, endpoints.fabric_games_url()?).await
}
