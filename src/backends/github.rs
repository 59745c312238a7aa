//! GitHub Gists backend.
//!
//! Gists are first-class on GitHub, so most operations are single REST calls;
//! only the listing fans out across pages.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{build_client, ensure_success, normalize_host, Provider};
use crate::config::BridgeConfig;
use crate::domain::language::infer_language;
use crate::domain::model::{AccessToken, FileChanges, Gist, NewFiles, Snippet, UserProfile};
use crate::domain::ports::GistBackend;
use crate::utils::error::{BridgeError, Result};

const BACKEND: &str = "github";
const MAX_LEGACY_PAGES: usize = 100;

#[derive(Debug)]
pub struct GitHubBackend {
    client: Client,
    api_base: String,
    oauth_base: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    per_page: usize,
    page_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubGist {
    id: String,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    files: HashMap<String, GitHubFile>,
    #[serde(default)]
    owner: Option<GitHubOwner>,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubFile {
    filename: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubUser {
    login: String,
}

fn to_gist(raw: GitHubGist) -> Gist {
    let files = raw
        .files
        .into_values()
        .map(|file| {
            let language = file
                .language
                .unwrap_or_else(|| infer_language(&file.filename).to_string());
            let snippet = Snippet {
                id: None,
                filename: file.filename.clone(),
                content: file.content,
                language,
            };
            (file.filename, snippet)
        })
        .collect();

    Gist {
        id: raw.id,
        description: raw.description.unwrap_or_default(),
        files,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        user: raw.owner.map(|o| o.login).unwrap_or_default(),
        project_id: None,
        html_url: raw.html_url,
    }
}

/// Pull the last page number out of a `Link` response header.
fn last_page_from_link(link: Option<&str>) -> usize {
    let Some(link) = link else { return 1 };
    let re = Regex::new(r#"[?&]page=(\d+)[^>]*>;\s*rel="last""#).unwrap();
    re.captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

/// Build the `files` object for a gist edit: `None` entries serialize as
/// `null`, which tells GitHub to delete the file.
fn edit_files_body(changes: &FileChanges) -> serde_json::Map<String, Value> {
    changes
        .iter()
        .map(|(filename, change)| {
            let value = match change {
                Some(content) => json!({ "content": content }),
                None => Value::Null,
            };
            (filename.clone(), value)
        })
        .collect()
}

impl GitHubBackend {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let section = config.github.clone().unwrap_or_default();

        Ok(Self {
            client: build_client(config.http.timeout_seconds)?,
            api_base: normalize_host(&section.api_host),
            oauth_base: normalize_host(&section.oauth_host),
            client_id: section.client_id,
            client_secret: section.client_secret,
            per_page: config.http.per_page,
            page_concurrency: config.http.concurrent_requests,
        })
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header("Authorization", format!("token {}", token))
    }

    async fn fetch_page(&self, token: &str, login: &str, page: usize) -> Result<reqwest::Response> {
        let url = format!("{}/users/{}/gists", self.api_base, login);
        let builder = self.client.get(&url).query(&[
            ("page", page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]);
        let resp = self.authorized(builder, token).send().await?;
        ensure_success(BACKEND, resp)
    }

    async fn fetch_page_body(
        &self,
        token: &str,
        login: &str,
        page: usize,
    ) -> Result<Vec<GitHubGist>> {
        let resp = self.fetch_page(token, login, page).await?;
        resp.json().await.map_err(BridgeError::from)
    }

    /// Paged listing: page one reveals the page count via the `Link` header,
    /// the rest is fetched concurrently and joined in order.
    async fn list_all(&self, token: &str, login: &str) -> Result<Vec<Gist>> {
        let first = self.fetch_page(token, login, 1).await?;
        let link = first
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let last_page = last_page_from_link(link.as_deref());

        let mut raw: Vec<GitHubGist> = first.json().await?;
        if last_page > 1 {
            tracing::debug!("fetching {} additional gist pages", last_page - 1);
            let pages: Vec<Vec<GitHubGist>> = stream::iter(
                (2..=last_page).map(|page| self.fetch_page_body(token, login, page)),
            )
            .buffered(self.page_concurrency)
            .try_collect()
            .await?;
            for page in pages {
                raw.extend(page);
            }
        }

        Ok(raw.into_iter().map(to_gist).collect())
    }

    /// Legacy listing: walk pages sequentially until one comes back empty.
    ///
    /// Errors end the walk and whatever was accumulated is returned, matching
    /// the old client behavior this path exists for.
    async fn list_all_legacy(&self, token: &str, login: &str) -> Result<Vec<Gist>> {
        let mut raw: Vec<GitHubGist> = Vec::new();
        for page in 1..=MAX_LEGACY_PAGES {
            let resp = match self.fetch_page(token, login, page).await {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::warn!("legacy gist listing stopped at page {}: {}", page, err);
                    break;
                }
            };
            let batch: Vec<GitHubGist> = match resp.json().await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!("legacy gist listing stopped at page {}: {}", page, err);
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }
            raw.extend(batch);
        }
        Ok(raw.into_iter().map(to_gist).collect())
    }
}

#[async_trait]
impl GistBackend for GitHubBackend {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    async fn exchange_access_token(&self, code: &str) -> Result<AccessToken> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| BridgeError::MissingConfig {
                field: "github.client_id".to_string(),
            })?;
        let client_secret =
            self.client_secret
                .as_deref()
                .ok_or_else(|| BridgeError::MissingConfig {
                    field: "github.client_secret".to_string(),
                })?;

        tracing::debug!("exchanging OAuth code for access token");
        let url = format!("{}/login/oauth/access_token", self.oauth_base);
        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "code": code,
            }))
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        Ok(resp.json().await?)
    }

    async fn get_user_profile(&self, token: &str) -> Result<UserProfile> {
        tracing::debug!("fetching authenticated user profile");
        let url = format!("{}/user", self.api_base);
        let resp = self.authorized(self.client.get(&url), token).send().await?;
        let resp = ensure_success(BACKEND, resp)?;
        let user: GitHubUser = resp.json().await?;

        Ok(UserProfile {
            login: user.login,
            project_id: None,
        })
    }

    async fn get_all_gists(&self, token: &str, profile: &UserProfile) -> Result<Vec<Gist>> {
        tracing::debug!("listing gists for {}", profile.login);
        match self.list_all(token, &profile.login).await {
            Ok(gists) => Ok(gists),
            Err(err) => {
                tracing::warn!(
                    "paged gist listing failed ({}), falling back to legacy pagination",
                    err
                );
                self.list_all_legacy(token, &profile.login).await
            }
        }
    }

    async fn get_single_gist(&self, token: &str, gist_id: &str, _brief: &Gist) -> Result<Gist> {
        tracing::debug!("fetching gist {}", gist_id);
        let url = format!("{}/gists/{}", self.api_base, gist_id);
        let resp = self.authorized(self.client.get(&url), token).send().await?;
        let resp = ensure_success(BACKEND, resp)?;
        let raw: GitHubGist = resp.json().await?;
        Ok(to_gist(raw))
    }

    async fn create_single_gist(
        &self,
        token: &str,
        _profile: &UserProfile,
        description: &str,
        files: &NewFiles,
        public: bool,
    ) -> Result<Gist> {
        if files.is_empty() {
            return Err(BridgeError::EmptyFileSet);
        }

        tracing::debug!("creating gist with {} files", files.len());
        let files_body: serde_json::Map<String, Value> = files
            .iter()
            .map(|(filename, content)| (filename.clone(), json!({ "content": content })))
            .collect();

        let url = format!("{}/gists", self.api_base);
        let resp = self
            .authorized(self.client.post(&url), token)
            .json(&json!({
                "description": description,
                "public": public,
                "files": files_body,
            }))
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        let raw: GitHubGist = resp.json().await?;
        Ok(to_gist(raw))
    }

    async fn edit_single_gist(
        &self,
        token: &str,
        gist_id: &str,
        description: &str,
        changes: &FileChanges,
        _existing: &Gist,
    ) -> Result<Gist> {
        tracing::debug!("editing gist {} ({} file changes)", gist_id, changes.len());
        let url = format!("{}/gists/{}", self.api_base, gist_id);
        let resp = self
            .authorized(self.client.patch(&url), token)
            .json(&json!({
                "description": description,
                "files": edit_files_body(changes),
            }))
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        let raw: GitHubGist = resp.json().await?;
        Ok(to_gist(raw))
    }

    async fn delete_single_gist(&self, token: &str, gist: &Gist) -> Result<()> {
        tracing::debug!("deleting gist {}", gist.id);
        let url = format!("{}/gists/{}", self.api_base, gist.id);
        let resp = self
            .authorized(self.client.delete(&url), token)
            .send()
            .await?;
        ensure_success(BACKEND, resp)?;
        Ok(())
    }
}
