use std::{
    ffi::OsString,
    io::{self, Cursor},
    path::{Path, PathBuf},
};

use futures_util::{stream, StreamExt};
use tokio::{fs, task};
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

use crate::{
    download::Manager,
    file::Hierarchy,
    metadata::{
        assets::AssetIndex,
        game::{LibraryFile, Resource, VersionInfo},
    },
    progress::InstallCallback,
    resources::Endpoints,
};

#[instrument]
async fn validate_file(
    path: &Path,
    expected_sha1: Option<&str>,
    expected_size: Option<u64>,
) -> crate::Result<bool> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if let Some(expected_size) = expected_size {
        if metadata.len() != expected_size {
            warn!(local_size = metadata.len(), expected_size, "File length mismatch");
            return Ok(false);
        }
    }

    #[cfg(feature = "sha1")]
    if let Some(expected_sha1) = expected_sha1 {
        use sha1::{Digest, Sha1};
        let filebuf = fs::read(path).await?;
        let local_sha1 = task::spawn_blocking(move || {
            let mut sha1 = Sha1::new();
            sha1.update(filebuf);
            hex::encode(sha1.finalize())
        })
        .await?;
        if local_sha1 != expected_sha1 {
            warn!(%local_sha1, expected_sha1, "File sha1sum mismatch");
            return Ok(false);
        }
    }
    #[cfg(not(feature = "sha1"))]
    let _ = expected_sha1;

    Ok(true)
}

/// Empty file recording that `archive` was unpacked into `natives_dir`.
fn extraction_marker(natives_dir: &Path, archive: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(archive.file_name().unwrap_or_default());
    name.push(".extracted");
    natives_dir.join(name)
}

/// Unpacks a natives archive, leaving out its `META-INF` entries.
fn extract_natives(archive: &[u8], natives_dir: &Path) -> crate::Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        if relative.starts_with("META-INF") {
            continue;
        }
        let target = natives_dir.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut output = std::fs::File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
    }
    Ok(())
}

#[derive(Debug)]
struct RemoteMetadata {
    url: String,
    sha1: Option<String>,
    size: Option<u64>,
}

impl From<&Resource> for RemoteMetadata {
    fn from(res: &Resource) -> Self {
        Self {
            url: res.url.clone(),
            sha1: Some(res.sha1.clone()),
            size: Some(res.size),
        }
    }
}

#[derive(Debug)]
enum IndexType {
    GameFile { path: PathBuf },
    NativeArtifact { path: PathBuf, natives_dir: PathBuf },
}

#[derive(Debug)]
struct Index {
    metadata: RemoteMetadata,
    itype: IndexType,
}

impl Index {
    fn library(hierarchy: &Hierarchy, file: LibraryFile) -> Self {
        Self {
            itype: IndexType::GameFile {
                path: hierarchy.library(&file.path),
            },
            metadata: RemoteMetadata {
                url: file.url,
                sha1: file.sha1,
                size: file.size,
            },
        }
    }

    fn path(&self) -> &Path {
        match &self.itype {
            IndexType::GameFile { path } | IndexType::NativeArtifact { path, .. } => path,
        }
    }

    async fn is_valid(&self) -> crate::Result<bool> {
        validate_file(
            self.path(),
            self.metadata.sha1.as_deref(),
            self.metadata.size,
        )
        .await
    }

    #[instrument(skip(downloader))]
    async fn pull(&self, downloader: &Manager) -> crate::Result<()> {
        match &self.itype {
            IndexType::GameFile { path } => {
                if self.is_valid().await? {
                    debug!(?path, "File is up to date");
                } else {
                    downloader.download_file(&self.metadata.url, path).await?;
                    info!(?path, url = %self.metadata.url, "File downloaded");
                }
            }
            IndexType::NativeArtifact { path, natives_dir } => {
                let downloaded = !self.is_valid().await?;
                if downloaded {
                    downloader.download_file(&self.metadata.url, path).await?;
                    info!(?path, url = %self.metadata.url, "Native archive downloaded");
                }
                let marker = extraction_marker(natives_dir, path);
                if !downloaded && marker.exists() {
                    debug!(?path, "Natives are up to date");
                    return Ok(());
                }
                fs::create_dir_all(natives_dir).await?;
                let filebuf = fs::read(path).await?;
                let target = natives_dir.clone();
                task::spawn_blocking(move || extract_natives(&filebuf, &target)).await??;
                fs::write(&marker, b"").await?;
                info!(?path, ?natives_dir, "Natives extracted");
            }
        }
        Ok(())
    }
}

/// Set of remote files to be mirrored into a game directory.
pub struct Repository {
    downloader: Manager,
    indices: Vec<Index>,
}

impl Repository {
    pub fn new(downloader: Manager) -> Self {
        Self {
            downloader,
            indices: vec![],
        }
    }

    pub fn downloader(&self) -> &Manager {
        &self.downloader
    }

    pub fn indices(&self) -> usize {
        self.indices.len()
    }

    pub fn purge(&mut self) {
        self.indices.clear();
    }

    pub fn track_file(&mut self, resource: &Resource, path: PathBuf) {
        self.indices.push(Index {
            metadata: RemoteMetadata::from(resource),
            itype: IndexType::GameFile { path },
        });
    }

    pub fn track_asset_objects(
        &mut self,
        hierarchy: &Hierarchy,
        endpoints: &Endpoints,
        asset_index: &AssetIndex,
    ) -> crate::Result<()> {
        let is_legacy_assets = asset_index.is_legacy();
        for (path, metadata) in &asset_index.objects {
            self.indices.push(Index {
                metadata: RemoteMetadata {
                    url: endpoints.asset_url(metadata)?.into(),
                    sha1: Some(metadata.hash.clone()),
                    size: Some(metadata.size),
                },
                itype: IndexType::GameFile {
                    path: if is_legacy_assets {
                        hierarchy.legacy_assets_dir().join(path)
                    } else {
                        hierarchy.asset_objects_dir().join(metadata.hashed_id())
                    },
                },
            });
        }
        Ok(())
    }

    pub fn track_libraries(
        &mut self,
        hierarchy: &Hierarchy,
        version: &VersionInfo,
    ) -> crate::Result<()> {
        for lib in version
            .libraries
            .iter()
            .filter(|lib| lib.is_supported_by_rules())
        {
            if let Some(artifact) = lib.artifact()? {
                self.indices.push(Index::library(hierarchy, artifact));
            }
            if let Some(native_artifact) = lib.native_for_os() {
                self.indices.push(Index {
                    metadata: RemoteMetadata {
                        url: native_artifact.url,
                        sha1: native_artifact.sha1,
                        size: native_artifact.size,
                    },
                    itype: IndexType::NativeArtifact {
                        path: hierarchy.library(&native_artifact.path),
                        natives_dir: hierarchy.natives_dir(&version.id),
                    },
                });
            }
        }
        Ok(())
    }

    pub fn track_client(&mut self, hierarchy: &Hierarchy, version: &VersionInfo) {
        if let Some(downloads) = &version.downloads {
            self.indices.push(Index {
                metadata: RemoteMetadata::from(&downloads.client),
                itype: IndexType::GameFile {
                    path: hierarchy.version_jar(version.jar_id()),
                },
            });
        }
        if let Some(logging) = &version.logging {
            self.indices.push(Index {
                metadata: RemoteMetadata::from(&logging.client.config.resource),
                itype: IndexType::GameFile {
                    path: log_config_path(hierarchy, &logging.client.config.id),
                },
            });
        }
    }

    /// Downloads every tracked file that is missing or stale.
    ///
    /// Announces the tracked count through `on_max`, then one `on_progress`
    /// per finished file. Files are pulled `concurrency` at a time but the
    /// callback is only ever driven from this future.
    #[instrument(skip(self, callback))]
    pub async fn pull_indices(
        &self,
        concurrency: usize,
        callback: &mut dyn InstallCallback,
    ) -> crate::Result<usize> {
        callback.on_max(self.indices.len() as i64)?;
        let mut pulls = stream::iter(self.indices.iter())
            .map(|index| index.pull(&self.downloader))
            .buffer_unordered(concurrency.max(1));
        let mut pulled = 0;
        while let Some(result) = pulls.next().await {
            result?;
            pulled += 1;
            callback.on_progress(pulled as i64)?;
        }
        Ok(pulled)
    }
}

pub fn log_config_path(hierarchy: &Hierarchy, id: &str) -> PathBuf {
    hierarchy.assets_dir.join("log_configs").join(id)
}
