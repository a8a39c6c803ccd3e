//! Test utilities for wingen.
//!
//! Provides an in-memory [`RemoteRepository`] with controllable latency and
//! failure injection, a minimal canned-response HTTP server for probe and
//! download tests, and manifest YAML fixtures. Available to unit tests and,
//! through the `test-utils` feature, to integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use crate::core::WingenError;
use crate::remote::{DirEntry, RemoteRepository};

/// Global flag so logging is only initialized once across tests.
static INIT_LOGGING: Once = Once::new();

/// Initialize tracing for tests, honoring `RUST_LOG` when set.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// An in-memory manifest repository.
///
/// Paths are flat strings; listing a directory returns its direct children
/// in sorted order. Reads can be delayed or poisoned per path to exercise
/// ordering and failure handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    files: BTreeMap<String, String>,
    read_delays: BTreeMap<String, Duration>,
    unreadable: BTreeSet<String>,
    unlistable: BTreeSet<String>,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `path` with `content`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Delay reads of `path` by `delay`.
    #[must_use]
    pub fn with_read_delay(mut self, path: impl Into<String>, delay: Duration) -> Self {
        self.read_delays.insert(path.into(), delay);
        self
    }

    /// Make reads of `path` fail with a simulated transport error.
    #[must_use]
    pub fn with_unreadable(mut self, path: impl Into<String>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// Make listing `path` fail with a simulated transport error.
    #[must_use]
    pub fn with_unlistable(mut self, path: impl Into<String>) -> Self {
        self.unlistable.insert(path.into());
        self
    }
}

impl RemoteRepository for MemoryRepository {
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, WingenError> {
        if self.unlistable.contains(path) {
            return Err(WingenError::Repository {
                path: path.to_string(),
                reason: "simulated listing failure".to_string(),
            });
        }
        let prefix = format!("{path}/");
        let mut names = BTreeSet::new();
        for file in self.files.keys() {
            if let Some(rest) = file.strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or(rest);
                names.insert(name.to_string());
            }
        }
        Ok(names
            .into_iter()
            .map(|name| DirEntry { path: format!("{prefix}{name}"), name })
            .collect())
    }

    async fn read_file(&self, path: &str) -> Result<String, WingenError> {
        if let Some(delay) = self.read_delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        if self.unreadable.contains(path) {
            return Err(WingenError::Repository {
                path: path.to_string(),
                reason: "simulated read failure".to_string(),
            });
        }
        self.files.get(path).cloned().ok_or_else(|| WingenError::Repository {
            path: path.to_string(),
            reason: "file not found".to_string(),
        })
    }
}

/// A canned HTTP response served by [`TestHttpServer`].
#[derive(Debug, Clone)]
pub struct CannedResponse {
    /// HTTP status code
    pub status: u16,
    /// Extra response headers
    pub headers: Vec<(String, String)>,
    /// Response body, omitted automatically for HEAD requests
    pub body: Vec<u8>,
}

impl CannedResponse {
    /// A 200 response with `body`.
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, headers: Vec::new(), body }
    }

    /// An empty response with `status`.
    pub fn status(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    /// A 302 redirect to `location`.
    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            headers: vec![("Location".to_string(), location.to_string())],
            body: Vec::new(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            302 => "Found",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Status",
        }
    }

    fn to_bytes(&self, include_body: bool) -> Vec<u8> {
        let mut response = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason());
        for (name, value) in &self.headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        response.push_str("Connection: close\r\n\r\n");
        let mut bytes = response.into_bytes();
        if include_body {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

/// A single-response HTTP server bound to an ephemeral local port.
///
/// Every request gets the same canned response; the number of served
/// requests is observable for download-avoidance assertions.
pub struct TestHttpServer {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestHttpServer {
    /// Bind a local listener and serve `response` to every request.
    pub async fn serve(response: CannedResponse) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("binding an ephemeral local port");
        let addr = listener.local_addr().expect("listener has a local address");
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let response = response.clone();
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let read = stream.read(&mut request).await.unwrap_or(0);
                    let is_head = request[..read].starts_with(b"HEAD ");
                    let _ = stream.write_all(&response.to_bytes(!is_head)).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, hits }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Version manifest YAML fixture.
pub fn version_manifest_yaml(identifier: &str, version: &str, default_locale: &str) -> String {
    format!(
        "PackageIdentifier: {identifier}\n\
         PackageVersion: {version}\n\
         DefaultLocale: {default_locale}\n\
         ManifestType: version\n\
         ManifestVersion: 1.6.0\n"
    )
}

/// Installer manifest YAML fixture with a single installer.
pub fn installer_manifest_yaml(identifier: &str, version: &str, url: &str, sha256: &str) -> String {
    format!(
        "PackageIdentifier: {identifier}\n\
         PackageVersion: {version}\n\
         Installers:\n\
         - Architecture: x64\n  \
           InstallerUrl: {url}\n  \
           InstallerSha256: {sha256}\n  \
           InstallerType: msi\n\
         ManifestType: installer\n\
         ManifestVersion: 1.6.0\n"
    )
}

/// Default locale manifest YAML fixture.
pub fn default_locale_manifest_yaml(identifier: &str, version: &str, locale: &str) -> String {
    format!(
        "PackageIdentifier: {identifier}\n\
         PackageVersion: {version}\n\
         PackageLocale: {locale}\n\
         Publisher: Example Publisher\n\
         PublisherUrl: https://example.com\n\
         PackageName: Example\n\
         License: MIT\n\
         ManifestType: defaultLocale\n\
         ManifestVersion: 1.6.0\n"
    )
}

/// Non-default locale manifest YAML fixture.
pub fn locale_manifest_yaml(identifier: &str, version: &str, locale: &str) -> String {
    format!(
        "PackageIdentifier: {identifier}\n\
         PackageVersion: {version}\n\
         PackageLocale: {locale}\n\
         ManifestType: locale\n\
         ManifestVersion: 1.6.0\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_repository_lists_direct_children_sorted() {
        let repo = MemoryRepository::new()
            .with_file("manifests/f/Foo/Bar/1.0/Foo.Bar.yaml", "a")
            .with_file("manifests/f/Foo/Bar/1.0/Foo.Bar.installer.yaml", "b")
            .with_file("manifests/f/Foo/Bar/2.0/Foo.Bar.yaml", "c");

        let entries = repo.list_dir("manifests/f/Foo/Bar").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["1.0", "2.0"]);

        let entries = repo.list_dir("manifests/f/Foo/Bar/1.0").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Foo.Bar.installer.yaml", "Foo.Bar.yaml"]);
    }

    #[tokio::test]
    async fn memory_repository_absent_directory_is_empty() {
        let repo = MemoryRepository::new();
        assert!(repo.list_dir("manifests/n/No/Where").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn canned_server_counts_hits() {
        let server = TestHttpServer::serve(CannedResponse::ok(b"ok".to_vec())).await;
        assert_eq!(server.hits(), 0);
        let body = reqwest::get(server.url("/x")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn fixtures_decode() {
        let yaml = version_manifest_yaml("Foo.Bar", "1.0", "en-US");
        let manifest: crate::manifest::VersionManifest =
            serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(manifest.default_locale.as_str(), "en-US");

        let yaml = installer_manifest_yaml("Foo.Bar", "1.0", "https://e.com/a.msi", "AA");
        let manifest: crate::manifest::InstallerManifest =
            serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(manifest.installers.len(), 1);
    }
}
