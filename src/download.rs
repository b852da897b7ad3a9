use std::{
    ffi::OsString,
    fmt::Debug,
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use reqwest::{Client, IntoUrl};
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, instrument, trace, warn};

const BUF_SIZE: usize = 1024 * 1024;

/// Streams remote files into the game directory and counts the bytes.
#[derive(Debug, Default)]
pub struct Manager {
    client: Client,
    downloaded_bytes: AtomicU64,
}

fn part_path(path: &Path) -> PathBuf {
    let mut part = OsString::from(path.as_os_str());
    part.push(".part");
    part.into()
}

impl Manager {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            downloaded_bytes: AtomicU64::new(0),
        }
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes.load(Ordering::Relaxed)
    }

    async fn stream_to(&self, url: impl IntoUrl, part: &Path) -> crate::Result<()> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        debug!(status = %response.status(), "Remote responded");
        let mut output = BufWriter::with_capacity(BUF_SIZE, File::create(part).await?);
        while let Some(chunk) = response.chunk().await? {
            trace!(len = chunk.len(), "New chunk arrived");
            output.write_all(&chunk).await?;
            self.downloaded_bytes
                .fetch_add(chunk.len() as u64, Ordering::Relaxed);
        }
        output.flush().await?;
        Ok(())
    }

    /// Downloads `url` to `path`, creating parent directories.
    ///
    /// The body lands in `<path>.part` first and is renamed into place once
    /// complete, so an interrupted pull never leaves a truncated file behind.
    #[instrument(skip(self))]
    pub async fn download_file<U, P>(&self, url: U, path: P) -> crate::Result<()>
    where
        U: IntoUrl + Debug,
        P: AsRef<Path> + Debug,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let part = part_path(path);
        if let Err(e) = self.stream_to(url, &part).await {
            match fs::remove_file(&part).await {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(?part, %cleanup, "Partial download left behind");
                }
                _ => {}
            }
            return Err(e);
        }
        fs::rename(&part, path).await?;
        Ok(())
    }
}
