use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use minerlaunch::errors::FetchError;
use minerlaunch::provision::fetch::{ArtifactFetcher, FetchFuture};

/// What a [`FakeFetcher`] does when asked to fetch.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Write these bytes to the destination and succeed.
    Archive(Vec<u8>),
    /// Fail with a non-success HTTP status, writing nothing.
    Status(u16),
    /// Write some bytes, then fail as if the connection dropped.
    Truncated(Vec<u8>, u16),
}

/// A fetcher that:
/// - records every URL it was asked for
/// - answers with a canned [`FakeResponse`].
#[derive(Debug, Clone)]
pub struct FakeFetcher {
    name: String,
    response: FakeResponse,
    calls: Arc<AtomicUsize>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new(name: &str, response: FakeResponse) -> Self {
        Self {
            name: name.to_string(),
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn serving(archive: Vec<u8>) -> Self {
        Self::new("fake", FakeResponse::Archive(archive))
    }

    pub fn failing(status: u16) -> Self {
        Self::new("fake", FakeResponse::Status(status))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    /// Boxed clone sharing the call counters, for handing to a provisioner.
    pub fn boxed(&self) -> Box<dyn ArtifactFetcher> {
        Box::new(self.clone())
    }
}

impl ArtifactFetcher for FakeFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(&'a self, url: &'a str, dest: &'a Path) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());

            let io_err = |source| FetchError::Io {
                path: dest.to_path_buf(),
                source,
            };

            match &self.response {
                FakeResponse::Archive(bytes) => {
                    tokio::fs::write(dest, bytes).await.map_err(io_err)?;
                    Ok(())
                }
                FakeResponse::Status(status) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                FakeResponse::Truncated(bytes, status) => {
                    tokio::fs::write(dest, bytes).await.map_err(io_err)?;
                    Err(FetchError::Status {
                        url: url.to_string(),
                        status: *status,
                    })
                }
            }
        })
    }
}
