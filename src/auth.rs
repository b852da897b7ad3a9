use md5::{Digest, Md5};
use uuid::{Builder, Uuid};

/// Player identity passed to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub username: String,
    pub uuid: Uuid,
    pub token: String,
}

impl LaunchOptions {
    /// Identity for offline play: a name-derived UUID and an empty token.
    pub fn offline(username: &str) -> Self {
        Self {
            username: username.to_owned(),
            uuid: offline_uuid(username),
            token: String::new(),
        }
    }

    pub fn user_type(&self) -> &'static str {
        if self.token.is_empty() {
            "legacy"
        } else {
            "msa"
        }
    }
}

/// Version 3 UUID of `OfflinePlayer:<name>`, as servers in offline mode derive it.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{username}").as_bytes());
    Builder::from_md5_bytes(digest.into()).into_uuid()
}
