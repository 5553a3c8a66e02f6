//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds an [`AppContext`] over temporary
//! upload/converted directories. The [`with_server`] constructor starts
//! Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use heifpress::server::{create_router, AppContext};
use heifpress_core::Config;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by
/// temporary storage directories.
pub struct TestHarness {
    pub ctx: AppContext,
    _data_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and temp storage.
    pub fn new() -> Self {
        let data_dir = TempDir::new().expect("failed to create temp dir");

        let mut config = Config::default();
        config.storage.upload_dir = data_dir.path().join("uploads");
        config.storage.converted_dir = data_dir.path().join("converted");
        std::fs::create_dir_all(&config.storage.upload_dir).expect("failed to create upload dir");
        std::fs::create_dir_all(&config.storage.converted_dir)
            .expect("failed to create converted dir");

        let ctx = AppContext {
            config: Arc::new(config),
        };

        Self {
            ctx,
            _data_dir: data_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Directory uploads are written to.
    pub fn upload_dir(&self) -> &Path {
        &self.ctx.config.storage.upload_dir
    }

    /// Directory converted files are served from.
    pub fn converted_dir(&self) -> &Path {
        &self.ctx.config.storage.converted_dir
    }

    /// Entries currently present in the upload directory.
    pub fn upload_entries(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.upload_dir())
            .map(|iter| iter.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}
