use crate::metadata::{FileDescriptor, MetadataError};
use crate::token::{AccessToken, TokenError, generate_access_token};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// The single file being shared and the two URLs that reach it.
///
/// Built once before the listener opens and read-only afterwards, so request
/// handlers share it behind an `Arc` without locking.
#[derive(Debug)]
pub struct ServingSession {
    file: FileDescriptor,
    token: AccessToken,
    info_path: String,
    download_path: String,
}

impl ServingSession {
    pub fn new(file: FileDescriptor, token: AccessToken) -> Self {
        let info_path = format!("/{}", token);
        let download_path = format!("{}/{}", info_path, file.basename);
        Self {
            file,
            token,
            info_path,
            download_path,
        }
    }

    /// Hash the file and mint a token
    pub async fn prepare(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let file = FileDescriptor::compute(path).await?;
        let token = generate_access_token()?;
        tracing::debug!("Prepared session for {} ({} bytes)", file.basename, file.size);
        Ok(Self::new(file, token))
    }

    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// `/{token}`
    pub fn info_path(&self) -> &str {
        &self.info_path
    }

    /// `/{token}/{basename}`, decoded form
    pub fn download_path(&self) -> &str {
        &self.download_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::SystemTime;

    #[test]
    fn test_derived_paths() {
        let file = FileDescriptor {
            basename: "report.pdf".to_string(),
            path: PathBuf::from("/srv/share/report.pdf"),
            size: 1,
            modified: SystemTime::UNIX_EPOCH,
            sha1: String::new(),
            sha256: String::new(),
        };
        let session = ServingSession::new(file, AccessToken::from_static("abc_-XYZ"));
        assert_eq!(session.info_path(), "/abc_-XYZ");
        assert_eq!(session.download_path(), "/abc_-XYZ/report.pdf");
    }

    #[tokio::test]
    async fn test_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        let session = ServingSession::prepare(&path).await.unwrap();
        assert_eq!(session.file().basename, "hello.txt");
        assert_eq!(session.file().size, 5);
        assert!(session.download_path().ends_with("/hello.txt"));
        assert!(session.download_path().starts_with(session.info_path()));
    }

    #[tokio::test]
    async fn test_prepare_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServingSession::prepare(dir.path().join("missing")).await;
        assert!(matches!(result, Err(SessionError::Metadata(_))));
    }
}
