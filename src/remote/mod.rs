//! Concurrent retrieval of a package's previously published manifests.
//!
//! Published manifests live in a directory-structured remote repository,
//! one directory per package version. Resolution lists that directory once
//! and then runs four logical fetch tasks against the listing:
//!
//! - **Installer**: `<id>.installer.yaml`, independent of everything else
//! - **Version**: `<id>.yaml`; on completion it publishes the manifest's
//!   default locale through a barrier, whether or not the file existed
//! - **Default locale**: waits on the barrier, then fetches
//!   `<id>.locale.<default>.yaml`
//! - **Locales**: waits on the barrier, then fetches every other
//!   `<id>.locale.<tag>.yaml` concurrently
//!
//! The barrier is the only ordering dependency: the two locale tasks never
//! match file names or read the default-locale value before the version
//! task has signaled. Parsed locale manifests funnel back through the one
//! task that owns the set, so no append races another.
//!
//! Absence is not failure. A missing directory means a brand-new package
//! and resolves every field to "unset"; a missing file leaves just its
//! field unset. Only reads and decodes of files that *do* exist produce
//! diagnostics, and those stay scoped to their own task.

pub mod github;

pub use github::GitHubRepository;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::constants::MAX_CONCURRENT_LOCALE_FETCHES;
use crate::core::WingenError;
use crate::manifest::{
    DefaultLocaleManifest, InstallerManifest, LocaleManifest, VersionManifest, decode_manifest,
    installer_manifest_name, locale_manifest_name, locale_manifest_pattern, locale_tag_from_name,
    version_manifest_name,
};
use crate::models::{LocaleTag, PackageIdentifier, PackageVersion};

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name within the listed directory
    pub name: String,
    /// Full repository path of the entry
    pub path: String,
}

/// Read access to the directory-structured manifest repository.
///
/// Listing an absent path yields an empty listing, not an error; errors are
/// reserved for transport and permission failures. Reading an absent file
/// is an error, but callers always check the listing first.
pub trait RemoteRepository: Send + Sync + 'static {
    /// List the entries directly under `path`, in repository order.
    fn list_dir(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<DirEntry>, WingenError>> + Send;

    /// Read the full content of the file at `path`.
    fn read_file(&self, path: &str) -> impl Future<Output = Result<String, WingenError>> + Send;
}

/// Best-effort snapshot of the manifests published for one package version.
///
/// Every field transitions from unset to set at most once, when its fetch
/// task completes; consumers only see the assembled struct afterwards.
/// Fetch diagnostics are retained per file in `errors`.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    /// Previously published version manifest
    pub version: Option<VersionManifest>,
    /// Previously published installer manifest
    pub installer: Option<InstallerManifest>,
    /// Previously published default locale manifest
    pub default_locale: Option<DefaultLocaleManifest>,
    /// Non-default locale manifests, keyed by locale tag
    pub locales: BTreeMap<LocaleTag, LocaleManifest>,
    /// Human-readable diagnostics for files that existed but could not be
    /// fetched or decoded
    pub errors: Vec<String>,
}

impl RemoteSnapshot {
    /// Whether nothing at all was previously published.
    pub fn is_new_package(&self) -> bool {
        self.version.is_none()
            && self.installer.is_none()
            && self.default_locale.is_none()
            && self.locales.is_empty()
    }
}

/// Completion signal of the version fetch, carrying the default locale when
/// one is known.
#[derive(Debug, Clone, Default)]
enum BarrierState {
    #[default]
    Pending,
    Ready(Option<LocaleTag>),
}

/// Wait for the version task to signal, returning the default locale if the
/// version manifest supplied one.
async fn await_default_locale(rx: &mut watch::Receiver<BarrierState>) -> Option<LocaleTag> {
    match rx.wait_for(|state| matches!(state, BarrierState::Ready(_))).await {
        Ok(guard) => match &*guard {
            BarrierState::Ready(tag) => tag.clone(),
            BarrierState::Pending => None,
        },
        // The version task died without signaling; behave as if no default
        // locale exists.
        Err(_) => None,
    }
}

/// A background fetch of one manifest file.
///
/// `Ok(None)` means the file was not previously published. Each task is
/// awaited at most once; dropping it instead detaches the fetch, which
/// runs to completion on its own.
pub struct FetchTask<T> {
    file: String,
    handle: JoinHandle<Result<Option<T>, WingenError>>,
}

impl<T: Send + 'static> FetchTask<T> {
    /// The file name this task is fetching, for diagnostics.
    pub fn file_name(&self) -> &str {
        &self.file
    }

    /// Await the task and surface its full result.
    pub async fn result(self) -> Result<Option<T>, WingenError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => Err(WingenError::Repository {
                path: self.file,
                reason: format!("fetch task failed: {join_error}"),
            }),
        }
    }

    /// Await the task, degrading failures to "no previous value" with a
    /// logged warning.
    pub async fn wait(self) -> Option<T> {
        let file = self.file.clone();
        match self.result().await {
            Ok(value) => value,
            Err(error) => {
                warn!(file = %file, %error, "previous manifest unavailable");
                None
            }
        }
    }

    fn failed(file: String, path: String, reason: String) -> Self {
        Self {
            file,
            handle: tokio::spawn(async move { Err(WingenError::Repository { path, reason }) }),
        }
    }
}

impl<T: DeserializeOwned + Send + 'static> FetchTask<T> {
    fn spawn_lookup<R: RemoteRepository>(
        repo: Arc<R>,
        entries: Arc<Vec<DirEntry>>,
        file: String,
    ) -> Self {
        let task_file = file.clone();
        Self {
            file,
            handle: tokio::spawn(async move {
                fetch_manifest::<R, T>(repo.as_ref(), &entries, &task_file).await
            }),
        }
    }
}

/// Aggregated result of the locale fetch task.
#[derive(Debug, Clone, Default)]
pub struct LocaleFetchOutcome {
    /// Successfully parsed non-default locale manifests
    pub locales: BTreeMap<LocaleTag, LocaleManifest>,
    /// Diagnostics for locale files that existed but failed
    pub errors: Vec<String>,
}

/// The background task collecting all non-default locale manifests.
pub struct LocalesTask {
    handle: JoinHandle<LocaleFetchOutcome>,
}

impl LocalesTask {
    /// Await the aggregated locale set.
    pub async fn wait(self) -> LocaleFetchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => LocaleFetchOutcome {
                locales: BTreeMap::new(),
                errors: vec![format!("locale fetch task failed: {join_error}")],
            },
        }
    }

    fn spawn<R: RemoteRepository>(
        repo: Arc<R>,
        entries: Arc<Vec<DirEntry>>,
        identifier: PackageIdentifier,
        mut rx: watch::Receiver<BarrierState>,
    ) -> Self {
        Self {
            handle: tokio::spawn(async move {
                let mut outcome = LocaleFetchOutcome::default();
                // Without a version manifest there is no default locale to
                // exclude and nothing published to collect.
                let Some(default_tag) = await_default_locale(&mut rx).await else {
                    return outcome;
                };

                let pattern = locale_manifest_pattern(&identifier);
                let files: Vec<DirEntry> = entries
                    .iter()
                    .filter(|entry| pattern.is_match(&entry.name))
                    .filter(|entry| {
                        locale_tag_from_name(&identifier, &entry.name)
                            .is_none_or(|tag| !tag.matches(&default_tag))
                    })
                    .cloned()
                    .collect();

                // Parsing fans out, but every result funnels back through
                // this task, the only writer of the locale set.
                let mut fetches = futures::stream::iter(files.into_iter().map(|entry| {
                    let repo = Arc::clone(&repo);
                    async move {
                        let result = async {
                            let content = repo.read_file(&entry.path).await?;
                            decode_manifest::<LocaleManifest>(&content, &entry.path)
                        }
                        .await;
                        (entry, result)
                    }
                }))
                .buffer_unordered(MAX_CONCURRENT_LOCALE_FETCHES);

                while let Some((entry, result)) = fetches.next().await {
                    match result {
                        Ok(manifest) => {
                            outcome.locales.insert(manifest.package_locale.clone(), manifest);
                        }
                        Err(error) => {
                            warn!(file = %entry.name, %error, "locale manifest unavailable");
                            outcome.errors.push(error.to_string());
                        }
                    }
                }
                outcome
            }),
        }
    }

    fn failed(path: String, reason: String) -> Self {
        Self {
            handle: tokio::spawn(async move {
                LocaleFetchOutcome {
                    locales: BTreeMap::new(),
                    errors: vec![format!("repository access failed for {path}: {reason}")],
                }
            }),
        }
    }
}

/// Handle to an in-flight resolution. Each field is independently
/// awaitable; [`SnapshotTasks::join`] awaits all four and assembles the
/// snapshot.
pub struct SnapshotTasks {
    /// Fetch of the version manifest
    pub version: FetchTask<VersionManifest>,
    /// Fetch of the installer manifest
    pub installer: FetchTask<InstallerManifest>,
    /// Fetch of the default locale manifest
    pub default_locale: FetchTask<DefaultLocaleManifest>,
    /// Fetch of all non-default locale manifests
    pub locales: LocalesTask,
}

impl SnapshotTasks {
    /// Await every fetch task and assemble the snapshot.
    ///
    /// Task failures degrade to unset fields and are retained as
    /// diagnostics on the snapshot.
    pub async fn join(self) -> RemoteSnapshot {
        let SnapshotTasks { version, installer, default_locale, locales } = self;
        let mut snapshot = RemoteSnapshot::default();

        let (version, installer, default_locale, locale_outcome) = tokio::join!(
            version.result(),
            installer.result(),
            default_locale.result(),
            locales.wait(),
        );

        match version {
            Ok(value) => snapshot.version = value,
            Err(error) => snapshot.errors.push(error.to_string()),
        }
        match installer {
            Ok(value) => snapshot.installer = value,
            Err(error) => snapshot.errors.push(error.to_string()),
        }
        match default_locale {
            Ok(value) => snapshot.default_locale = value,
            Err(error) => snapshot.errors.push(error.to_string()),
        }
        snapshot.locales = locale_outcome.locales;
        snapshot.errors.extend(locale_outcome.errors);

        if !snapshot.errors.is_empty() {
            warn!(
                errors = snapshot.errors.len(),
                "some previous manifests were unavailable"
            );
        }
        snapshot
    }

    fn unavailable(identifier: &PackageIdentifier, path: &str, reason: &str) -> Self {
        Self {
            version: FetchTask::failed(
                version_manifest_name(identifier),
                path.to_string(),
                reason.to_string(),
            ),
            installer: FetchTask::failed(
                installer_manifest_name(identifier),
                path.to_string(),
                reason.to_string(),
            ),
            default_locale: FetchTask::failed(
                format!("{identifier}.locale.yaml"),
                path.to_string(),
                reason.to_string(),
            ),
            locales: LocalesTask::failed(path.to_string(), reason.to_string()),
        }
    }
}

/// Resolves previously published manifests for a package.
///
/// # Examples
///
/// ```rust,no_run
/// use wingen::models::{PackageIdentifier, PackageVersion};
/// use wingen::remote::{GitHubRepository, RemoteManifestResolver};
///
/// # async fn example() -> anyhow::Result<()> {
/// let resolver = RemoteManifestResolver::new(GitHubRepository::community()?);
/// let identifier = PackageIdentifier::new("Microsoft.Excel");
///
/// if let Some(latest) = resolver.latest_version(&identifier).await {
///     let snapshot = resolver.resolve(&identifier, &latest).await.join().await;
///     if let Some(installer) = &snapshot.installer {
///         println!("{} installers previously published", installer.installers.len());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct RemoteManifestResolver<R: RemoteRepository> {
    repo: Arc<R>,
}

impl<R: RemoteRepository> RemoteManifestResolver<R> {
    /// Create a resolver over the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo: Arc::new(repo) }
    }

    /// Start resolving the manifests published for `identifier` at
    /// `version`.
    ///
    /// Never fails: a missing directory resolves every field to unset, and
    /// a listing transport failure resolves every field to unavailable
    /// with the failure recorded. The returned handle's tasks are already
    /// running when this returns.
    pub async fn resolve(
        &self,
        identifier: &PackageIdentifier,
        version: &PackageVersion,
    ) -> SnapshotTasks {
        let dir = identifier.version_path(version);
        debug!(%identifier, %version, path = %dir, "resolving previous manifests");

        let entries = match self.repo.list_dir(&dir).await {
            Ok(entries) => {
                if entries.is_empty() {
                    debug!(path = %dir, "nothing published, treating as new package");
                }
                Arc::new(entries)
            }
            Err(error) => {
                warn!(path = %dir, %error, "listing failed, previous manifests unavailable");
                return SnapshotTasks::unavailable(identifier, &dir, &error.to_string());
            }
        };

        let (barrier_tx, barrier_rx) = watch::channel(BarrierState::Pending);

        let installer = FetchTask::spawn_lookup(
            Arc::clone(&self.repo),
            Arc::clone(&entries),
            installer_manifest_name(identifier),
        );

        let version_file = version_manifest_name(identifier);
        let version = {
            let repo = Arc::clone(&self.repo);
            let entries = Arc::clone(&entries);
            let file = version_file.clone();
            FetchTask {
                file: version_file,
                handle: tokio::spawn(async move {
                    let result =
                        fetch_manifest::<R, VersionManifest>(repo.as_ref(), &entries, &file).await;
                    let default_locale = match &result {
                        Ok(Some(manifest)) => Some(manifest.default_locale.clone()),
                        _ => None,
                    };
                    // Signal completion even when the file is absent or
                    // broken; the dependent tasks wait on this regardless.
                    let _ = barrier_tx.send(BarrierState::Ready(default_locale));
                    result
                }),
            }
        };

        let default_locale = {
            let repo = Arc::clone(&self.repo);
            let entries = Arc::clone(&entries);
            let identifier = identifier.clone();
            let mut rx = barrier_rx.clone();
            FetchTask {
                file: format!("{identifier}.locale.yaml"),
                handle: tokio::spawn(async move {
                    let Some(tag) = await_default_locale(&mut rx).await else {
                        return Ok(None);
                    };
                    let file = locale_manifest_name(&identifier, &tag);
                    fetch_manifest::<R, DefaultLocaleManifest>(repo.as_ref(), &entries, &file)
                        .await
                }),
            }
        };

        let locales = LocalesTask::spawn(
            Arc::clone(&self.repo),
            entries,
            identifier.clone(),
            barrier_rx,
        );

        SnapshotTasks { version, installer, default_locale, locales }
    }

    /// The latest published version of `identifier`, if any.
    ///
    /// Lists the package directory and picks the maximum version-shaped
    /// entry. Listing failures degrade to `None` with a warning; a new
    /// package legitimately has no versions.
    pub async fn latest_version(&self, identifier: &PackageIdentifier) -> Option<PackageVersion> {
        let path = identifier.directory_path();
        match self.repo.list_dir(&path).await {
            Ok(entries) => entries
                .iter()
                // Dotfiles and stray manifests are not version directories.
                .filter(|entry| !entry.name.starts_with('.') && !entry.name.ends_with(".yaml"))
                .map(|entry| PackageVersion::new(entry.name.clone()))
                .max(),
            Err(error) => {
                warn!(path = %path, %error, "version listing failed");
                None
            }
        }
    }

    /// Whether any version of `identifier` has been published.
    pub async fn package_exists(&self, identifier: &PackageIdentifier) -> bool {
        let path = identifier.directory_path();
        match self.repo.list_dir(&path).await {
            Ok(entries) => !entries.is_empty(),
            Err(error) => {
                warn!(path = %path, %error, "existence check failed");
                false
            }
        }
    }
}

async fn fetch_manifest<R: RemoteRepository, T: DeserializeOwned>(
    repo: &R,
    entries: &[DirEntry],
    file_name: &str,
) -> Result<Option<T>, WingenError> {
    let Some(entry) = entries.iter().find(|entry| entry.name == file_name) else {
        debug!(file = %file_name, "not previously published");
        return Ok(None);
    };
    let content = repo.read_file(&entry.path).await?;
    let manifest = decode_manifest(&content, &entry.path)?;
    debug!(file = %file_name, "previous manifest loaded");
    Ok(Some(manifest))
}
