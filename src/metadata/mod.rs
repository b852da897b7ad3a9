pub mod assets;
pub mod fabric;
pub mod game;
pub mod manifest;
pub mod maven;
