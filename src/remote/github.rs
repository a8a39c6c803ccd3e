//! GitHub-hosted manifest repository access.
//!
//! The community manifest repository lives on GitHub, so directory listing
//! maps to the REST contents endpoint and file reads map to raw content
//! downloads. A 404 from the listing endpoint is the "new package" state
//! and yields an empty listing.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_MANIFEST_REPOSITORY, REQUEST_TIMEOUT, USER_AGENT};
use crate::core::WingenError;
use crate::remote::{DirEntry, RemoteRepository};

/// One entry of a contents-API listing response.
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
}

/// A [`RemoteRepository`] backed by a GitHub repository.
pub struct GitHubRepository {
    client: reqwest::Client,
    /// `owner/repo` slug
    repo: String,
}

impl GitHubRepository {
    /// Access the community manifest repository.
    pub fn community() -> reqwest::Result<Self> {
        Self::for_repo(DEFAULT_MANIFEST_REPOSITORY)
    }

    /// Access an arbitrary `owner/repo` manifest repository, e.g. a fork.
    pub fn for_repo(repo: impl Into<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, repo: repo.into() })
    }

    fn contents_url(&self, path: &str) -> String {
        format!("https://api.github.com/repos/{}/contents/{path}", self.repo)
    }

    fn raw_url(&self, path: &str) -> String {
        format!("https://raw.githubusercontent.com/{}/HEAD/{path}", self.repo)
    }
}

impl RemoteRepository for GitHubRepository {
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, WingenError> {
        let url = self.contents_url(path);
        debug!(%url, "listing repository directory");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| WingenError::network(&url, source))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let entries: Vec<ContentsEntry> = response
                    .json()
                    .await
                    .map_err(|source| WingenError::network(&url, source))?;
                Ok(entries
                    .into_iter()
                    .map(|entry| DirEntry { name: entry.name, path: entry.path })
                    .collect())
            }
            status => Err(WingenError::UnsuccessfulResponse { url, status }),
        }
    }

    async fn read_file(&self, path: &str) -> Result<String, WingenError> {
        let url = self.raw_url(path);
        debug!(%url, "reading repository file");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| WingenError::network(&url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WingenError::UnsuccessfulResponse { url, status });
        }
        response
            .text()
            .await
            .map_err(|source| WingenError::network(&url, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_url_targets_the_configured_repo() {
        let repo = GitHubRepository::for_repo("octo/manifests").unwrap();
        assert_eq!(
            repo.contents_url("manifests/f/Foo/Bar/1.0"),
            "https://api.github.com/repos/octo/manifests/contents/manifests/f/Foo/Bar/1.0"
        );
    }

    #[test]
    fn raw_url_reads_from_head() {
        let repo = GitHubRepository::for_repo("octo/manifests").unwrap();
        assert_eq!(
            repo.raw_url("manifests/f/Foo/Bar/1.0/Foo.Bar.yaml"),
            "https://raw.githubusercontent.com/octo/manifests/HEAD/manifests/f/Foo/Bar/1.0/Foo.Bar.yaml"
        );
    }

    #[test]
    fn community_repo_is_the_default() {
        let repo = GitHubRepository::community().unwrap();
        assert!(repo.contents_url("manifests").contains(DEFAULT_MANIFEST_REPOSITORY));
    }
}
