#![allow(dead_code)]

use once_core::{RunningServer, ServeConfig, ServingSession, start};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub session: Arc<ServingSession>,
    pub server: RunningServer,
}

impl Fixture {
    pub fn base(&self) -> String {
        format!("http://{}", self.server.local_addr())
    }

    pub fn info_url(&self) -> String {
        format!("{}{}", self.base(), self.session.info_path())
    }

    pub fn download_url(&self) -> String {
        format!("{}{}", self.base(), self.session.download_path())
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Serve a temp file with the given name and content on 127.0.0.1
pub async fn serve(name: &str, content: &[u8], timeout: Duration) -> Fixture {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();

    let session = Arc::new(ServingSession::prepare(&path).await.unwrap());
    let config = ServeConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        timeout,
        advertise_host: None,
    };
    let server = start(&config, session.clone()).await.unwrap();

    Fixture {
        dir,
        path,
        session,
        server,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
