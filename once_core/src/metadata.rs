use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Buffer size for hashing (1MB)
pub const BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),
    #[error("failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// Metadata of the shared file, computed once before serving starts
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub basename: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// Lowercase hex SHA-1
    pub sha1: String,
    /// Lowercase hex SHA-256
    pub sha256: String,
}

impl FileDescriptor {
    /// Read the whole file once, hashing with SHA-1 and SHA-256 in the same pass
    pub async fn compute(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref().to_path_buf();
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| MetadataError::NoFileName(path.clone()))?;

        let mut file = File::open(&path).await.map_err(|source| MetadataError::Open {
            path: path.clone(),
            source,
        })?;
        let stat = file.metadata().await.map_err(|source| MetadataError::Open {
            path: path.clone(),
            source,
        })?;
        if !stat.is_file() {
            return Err(MetadataError::NotAFile(path));
        }
        let modified = stat.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let mut sha1 = Sha1::new();
        let mut sha256 = Sha256::new();
        let mut size = 0u64;
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let n = file.read(&mut buffer).await.map_err(|source| MetadataError::Read {
                path: path.clone(),
                source,
            })?;
            if n == 0 {
                break;
            }
            sha1.update(&buffer[..n]);
            sha256.update(&buffer[..n]);
            size += n as u64;
        }

        Ok(Self {
            basename,
            path,
            size,
            modified,
            sha1: hex::encode(sha1.finalize()),
            sha256: hex::encode(sha256.finalize()),
        })
    }
}
