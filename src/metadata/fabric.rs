use serde_derive::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct LoaderVersion {
    pub separator: String,
    pub build: u32,
    pub maven: String,
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GameVersion {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

/// Newest stable loader, falling back to the newest one at all.
///
/// Fabric meta lists loaders newest first.
pub fn latest_loader(loaders: &[LoaderVersion]) -> Option<&LoaderVersion> {
    loaders
        .iter()
        .find(|loader| loader.stable)
        .or_else(|| loaders.first())
}

pub fn is_supported(game_versions: &[GameVersion], minecraft_version: &str) -> bool {
    game_versions
        .iter()
        .any(|game| game.version == minecraft_version)
}

/// Version id Fabric profiles install under.
pub fn version_id(loader_version: &str, minecraft_version: &str) -> String {
    format!("fabric-loader-{loader_version}-{minecraft_version}")
}
