use std::{env, io, result};

pub mod auth;
pub mod download;
pub mod fabric;
pub mod file;
pub mod install;
pub mod metadata;
pub mod process;
pub mod progress;
pub mod resources;
pub mod settings;
pub mod sync;
pub mod update;
pub mod versions;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    TokioJoinError(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    JoinPaths(#[from] env::JoinPathsError),
    #[error("unknown version {0}")]
    UnknownVersion(String),
    #[error("minecraft version {0} is not supported by fabric")]
    UnsupportedVersion(String),
    #[error("no installed version matches {0:?}")]
    NoMatchingVersion(Vec<String>),
    #[error("invalid library name {0}")]
    InvalidLibraryName(String),
    #[error("version {0} inherits from itself")]
    InheritanceCycle(String),
    #[error("no fabric loader versions available")]
    NoLoaderVersion,
    #[error("username is required")]
    MissingUsername,
}

pub type Result<T> = result::Result<T, Error>;
