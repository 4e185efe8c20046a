//! Object fetcher - materializes one object under the download root

use crate::envelope::ObjectRef;
use crate::storage::{ObjectSource, ObjectStream, SourceError};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Retrieval failed: {0}")]
    Source(#[from] SourceError),

    #[error("Refusing to mirror key '{0}': it does not resolve to a path under the download root")]
    UnsafeKey(String),

    #[error("Write to {} failed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Non-fatal results of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched { path: PathBuf, bytes: u64 },
    /// The store no longer has the object; the notification was stale
    Missing,
    /// Folder placeholder key (ends with `/`); only the directory is created
    Directory { path: PathBuf },
}

/// Map an object key to its location under `root`.
///
/// Keys are `/`-separated. Empty and `.` segments are dropped the way a path
/// join would; `..` segments are rejected.
pub fn local_path(root: &Path, key: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    let mut depth = 0usize;

    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(FetchError::UnsafeKey(key.to_string())),
            name => {
                path.push(name);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(FetchError::UnsafeKey(key.to_string()));
    }

    Ok(path)
}

pub struct Fetcher {
    source: Arc<dyn ObjectSource>,
    root: PathBuf,
}

impl Fetcher {
    pub fn new(source: Arc<dyn ObjectSource>, root: impl Into<PathBuf>) -> Self {
        Self {
            source,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Retrieve `object` into `<root>/<key>`, replacing any previous copy.
    ///
    /// Parent directories are created before the store is asked for the
    /// object. Bytes go to a temporary sibling first and are renamed into place
    /// only after the whole body has been written and flushed.
    pub async fn fetch(&self, object: &ObjectRef) -> Result<FetchOutcome> {
        let path = local_path(&self.root, &object.key)?;

        if object.key.ends_with('/') {
            create_dir_all(&path).await?;
            debug!(bucket = %object.bucket, key = %object.key, "Folder placeholder, directory ensured");
            return Ok(FetchOutcome::Directory { path });
        }

        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }

        let stream = match self.source.open(&object.bucket, &object.key).await {
            Ok(stream) => stream,
            Err(e) if e.is_not_found() => {
                warn!(
                    bucket = %object.bucket,
                    key = %object.key,
                    "Object no longer exists in the bucket, ignoring"
                );
                return Ok(FetchOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = write_replacing(&path, stream).await?;
        info!(
            bucket = %object.bucket,
            key = %object.key,
            path = %path.display(),
            bytes,
            "Object mirrored"
        );

        Ok(FetchOutcome::Fetched { path, bytes })
    }
}

async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.part", Uuid::new_v4().simple()))
}

/// Stream into a temp file, then rename over `path`. The temp file is removed
/// on any failure, leaving a previous copy at `path` untouched.
async fn write_replacing(path: &Path, mut stream: ObjectStream) -> Result<u64> {
    let tmp = temp_path(path);
    let io_err = |source| FetchError::Io {
        path: tmp.clone(),
        source,
    };

    let result: Result<u64> = async {
        let mut file = fs::File::create(&tmp).await.map_err(io_err)?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, path).await.map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(written)
    }
    .await;

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp).await {
            debug!(path = %tmp.display(), error = %e, "Temp file cleanup failed");
        }
    }

    result
}
