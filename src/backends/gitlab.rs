//! GitLab project Snippets backend.
//!
//! GitLab has no gist concept, so one gist maps to a set of single-file
//! snippets sharing a title inside one configured project. Listing flattens
//! pages of snippets and regroups them by title; create, edit and delete fan
//! out one request per file.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use md5::{Digest, Md5};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{build_client, ensure_success, normalize_host, Provider};
use crate::config::BridgeConfig;
use crate::domain::language::infer_language;
use crate::domain::model::{AccessToken, FileChanges, Gist, NewFiles, Snippet, UserProfile};
use crate::domain::ports::GistBackend;
use crate::utils::error::{BridgeError, Result};

const BACKEND: &str = "gitlab";
const MAX_LEGACY_PAGES: usize = 100;

#[derive(Debug)]
pub struct GitLabBackend {
    client: Client,
    host: String,
    api_base: String,
    group: String,
    name: String,
    per_page: usize,
    page_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct GitLabSnippet {
    id: u64,
    title: String,
    file_name: String,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    web_url: String,
    project_id: u64,
    author: GitLabAuthor,
}

#[derive(Debug, Clone, Deserialize)]
struct GitLabAuthor {
    username: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GitLabUser {
    username: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GitLabProject {
    id: u64,
    path_with_namespace: String,
}

/// The gist title for a description: its lowercase hex MD5.
///
/// Descriptions are free-form user text; hashing them yields a stable title
/// every snippet of the gist can share.
fn gist_title(description: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(description.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_snippet(raw: &GitLabSnippet) -> Snippet {
    Snippet {
        id: Some(raw.id),
        filename: raw.file_name.clone(),
        content: None,
        language: infer_language(&raw.file_name).to_string(),
    }
}

/// Group a flat snippet list into gists keyed by title.
///
/// Snippets are sorted by title (descending) first, so groups come out in a
/// stable order. Gist metadata is taken from the snippets of the group; when
/// they disagree the last one wins.
fn group_snippets(mut snippets: Vec<GitLabSnippet>) -> Vec<Gist> {
    snippets.sort_by(|a, b| b.title.cmp(&a.title));

    let mut gists: Vec<Gist> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for snippet in snippets {
        let idx = match index.get(&snippet.title) {
            Some(&idx) => idx,
            None => {
                index.insert(snippet.title.clone(), gists.len());
                gists.push(Gist {
                    id: snippet.title.clone(),
                    description: String::new(),
                    files: HashMap::new(),
                    created_at: snippet.created_at,
                    updated_at: snippet.updated_at,
                    user: String::new(),
                    project_id: Some(snippet.project_id),
                    html_url: String::new(),
                });
                gists.len() - 1
            }
        };

        let gist = &mut gists[idx];
        gist.description = snippet.description.clone().unwrap_or_default();
        gist.created_at = snippet.created_at;
        gist.updated_at = snippet.updated_at;
        gist.user = snippet.author.username.clone();
        gist.html_url = snippet.web_url.clone();
        gist.project_id = Some(snippet.project_id);
        gist.files.insert(snippet.file_name.clone(), to_snippet(&snippet));
    }

    gists
}

impl GitLabBackend {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let section = config
            .gitlab
            .clone()
            .ok_or_else(|| BridgeError::MissingConfig {
                field: "gitlab".to_string(),
            })?;

        let host = normalize_host(&section.host);
        Ok(Self {
            client: build_client(config.http.timeout_seconds)?,
            api_base: format!("{}/api/v4", host),
            host,
            group: section.group,
            name: section.name,
            per_page: config.http.per_page,
            page_concurrency: config.http.concurrent_requests,
        })
    }

    /// Find the configured snippet project by searching for its name and
    /// matching the full `group/name` path.
    async fn resolve_project_id(&self, token: &str) -> Result<u64> {
        let full_path = format!("{}/{}", self.group, self.name);
        tracing::debug!("resolving snippet project {}", full_path);

        let url = format!("{}/projects", self.api_base);
        let resp = self
            .client
            .get(&url)
            .query(&[("private_token", token), ("search", self.name.as_str())])
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        let projects: Vec<GitLabProject> = resp.json().await?;

        projects
            .into_iter()
            .find(|project| project.path_with_namespace == full_path)
            .map(|project| project.id)
            .ok_or_else(|| BridgeError::ProjectNotFound {
                path: full_path,
                host: self.host.clone(),
            })
    }

    async fn fetch_snippet_page(
        &self,
        token: &str,
        project_id: u64,
        page: usize,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/projects/{}/snippets", self.api_base, project_id);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("private_token", token),
                ("per_page", &self.per_page.to_string()),
                ("page", &page.to_string()),
            ])
            .send()
            .await?;
        ensure_success(BACKEND, resp)
    }

    async fn fetch_snippet_page_body(
        &self,
        token: &str,
        project_id: u64,
        page: usize,
    ) -> Result<Vec<GitLabSnippet>> {
        let resp = self.fetch_snippet_page(token, project_id, page).await?;
        resp.json().await.map_err(BridgeError::from)
    }

    /// Paged listing: page one reveals the page count via `x-total-pages`,
    /// the rest is fetched concurrently and joined.
    async fn list_all(&self, token: &str, project_id: u64) -> Result<Vec<Gist>> {
        let first = self.fetch_snippet_page(token, project_id, 1).await?;
        let total_pages: usize = first
            .headers()
            .get("x-total-pages")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let mut snippets: Vec<GitLabSnippet> = first.json().await?;
        if total_pages > 1 {
            tracing::debug!("fetching {} additional snippet pages", total_pages - 1);
            let pages: Vec<Vec<GitLabSnippet>> = stream::iter(
                (2..=total_pages).map(|page| self.fetch_snippet_page_body(token, project_id, page)),
            )
            .buffered(self.page_concurrency)
            .try_collect()
            .await?;
            for page in pages {
                snippets.extend(page);
            }
        }

        Ok(group_snippets(snippets))
    }

    /// Legacy listing: walk pages sequentially until one comes back empty.
    ///
    /// Errors end the walk and whatever was accumulated is returned, matching
    /// the old client behavior this path exists for.
    async fn list_all_legacy(&self, token: &str, project_id: u64) -> Result<Vec<Gist>> {
        let mut snippets: Vec<GitLabSnippet> = Vec::new();
        for page in 1..=MAX_LEGACY_PAGES {
            let batch = match self.fetch_snippet_page_body(token, project_id, page).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!("legacy snippet listing stopped at page {}: {}", page, err);
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }
            snippets.extend(batch);
        }
        Ok(group_snippets(snippets))
    }

    async fn create_snippet(
        &self,
        token: &str,
        project_id: u64,
        title: &str,
        description: &str,
        filename: &str,
        content: &str,
        public: bool,
    ) -> Result<GitLabSnippet> {
        tracing::debug!("creating snippet {}", filename);
        let url = format!("{}/projects/{}/snippets", self.api_base, project_id);
        let resp = self
            .client
            .post(&url)
            .query(&[("private_token", token)])
            .json(&json!({
                "title": title,
                "description": description,
                "visibility": if public { "public" } else { "private" },
                "file_name": filename,
                "code": content,
            }))
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        resp.json().await.map_err(BridgeError::from)
    }

    async fn update_snippet(
        &self,
        token: &str,
        project_id: u64,
        snippet_id: u64,
        title: &str,
        description: &str,
        filename: &str,
        content: &str,
    ) -> Result<GitLabSnippet> {
        tracing::debug!("updating snippet {} ({})", snippet_id, filename);
        let url = format!(
            "{}/projects/{}/snippets/{}",
            self.api_base, project_id, snippet_id
        );
        let resp = self
            .client
            .put(&url)
            .query(&[("private_token", token)])
            .json(&json!({
                "title": title,
                "description": description,
                "file_name": filename,
                "code": content,
            }))
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        resp.json().await.map_err(BridgeError::from)
    }

    async fn delete_snippet(&self, token: &str, project_id: u64, snippet_id: u64) -> Result<()> {
        tracing::debug!("deleting snippet {}", snippet_id);
        let url = format!(
            "{}/projects/{}/snippets/{}",
            self.api_base, project_id, snippet_id
        );
        let resp = self
            .client
            .delete(&url)
            .query(&[("private_token", token)])
            .send()
            .await?;
        ensure_success(BACKEND, resp)?;
        Ok(())
    }

    async fn fetch_snippet_content(
        &self,
        token: &str,
        project_id: u64,
        mut snippet: Snippet,
    ) -> Result<Snippet> {
        let snippet_id = snippet.id.ok_or_else(|| BridgeError::MissingSnippetId {
            filename: snippet.filename.clone(),
        })?;

        let url = format!(
            "{}/projects/{}/snippets/{}/raw",
            self.api_base, project_id, snippet_id
        );
        let resp = self
            .client
            .get(&url)
            .query(&[("private_token", token)])
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        snippet.content = Some(resp.text().await?);
        Ok(snippet)
    }

    /// Fetch the raw content of every file in `gist`, concurrently.
    async fn fill_contents(&self, token: &str, project_id: u64, mut gist: Gist) -> Result<Gist> {
        let fetches: Vec<_> = gist
            .files
            .values()
            .cloned()
            .map(|snippet| self.fetch_snippet_content(token, project_id, snippet))
            .collect();
        let filled = try_join_all(fetches).await?;

        for snippet in filled {
            gist.files.insert(snippet.filename.clone(), snippet);
        }
        Ok(gist)
    }
}

#[async_trait]
impl GistBackend for GitLabBackend {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    async fn exchange_access_token(&self, _code: &str) -> Result<AccessToken> {
        // GitLab access uses personal tokens configured out of band.
        Err(BridgeError::Unsupported {
            operation: "exchange_access_token",
            provider: "gitlab",
        })
    }

    async fn get_user_profile(&self, token: &str) -> Result<UserProfile> {
        tracing::debug!("fetching authenticated user profile");
        let url = format!("{}/user", self.api_base);
        let resp = self
            .client
            .get(&url)
            .query(&[("private_token", token)])
            .send()
            .await?;
        let resp = ensure_success(BACKEND, resp)?;
        let user: GitLabUser = resp.json().await?;

        let project_id = self.resolve_project_id(token).await?;
        Ok(UserProfile {
            login: user.username,
            project_id: Some(project_id),
        })
    }

    async fn get_all_gists(&self, token: &str, profile: &UserProfile) -> Result<Vec<Gist>> {
        let project_id = profile
            .project_id
            .ok_or_else(|| BridgeError::MissingProjectId {
                id: profile.login.clone(),
            })?;

        tracing::debug!("listing snippets of project {}", project_id);
        match self.list_all(token, project_id).await {
            Ok(gists) => Ok(gists),
            Err(err) => {
                tracing::warn!(
                    "paged snippet listing failed ({}), falling back to legacy pagination",
                    err
                );
                self.list_all_legacy(token, project_id).await
            }
        }
    }

    async fn get_single_gist(&self, token: &str, gist_id: &str, brief: &Gist) -> Result<Gist> {
        let project_id = brief
            .project_id
            .ok_or_else(|| BridgeError::MissingProjectId {
                id: gist_id.to_string(),
            })?;

        tracing::debug!("fetching contents of gist {}", gist_id);
        self.fill_contents(token, project_id, brief.clone()).await
    }

    async fn create_single_gist(
        &self,
        token: &str,
        profile: &UserProfile,
        description: &str,
        files: &NewFiles,
        public: bool,
    ) -> Result<Gist> {
        if files.is_empty() {
            return Err(BridgeError::EmptyFileSet);
        }
        let project_id = profile
            .project_id
            .ok_or_else(|| BridgeError::MissingProjectId {
                id: profile.login.clone(),
            })?;

        let title = gist_title(description);
        tracing::debug!("creating gist {} with {} files", title, files.len());

        let creates: Vec<_> = files
            .iter()
            .map(|(filename, content)| {
                self.create_snippet(
                    token,
                    project_id,
                    &title,
                    description,
                    filename,
                    content,
                    public,
                )
            })
            .collect();
        let created = try_join_all(creates).await?;

        let gist = group_snippets(created)
            .into_iter()
            .next()
            .ok_or(BridgeError::EmptyFileSet)?;
        self.fill_contents(token, project_id, gist).await
    }

    async fn edit_single_gist(
        &self,
        token: &str,
        gist_id: &str,
        description: &str,
        changes: &FileChanges,
        existing: &Gist,
    ) -> Result<Gist> {
        let project_id = existing
            .project_id
            .ok_or_else(|| BridgeError::MissingProjectId {
                id: gist_id.to_string(),
            })?;

        tracing::debug!("editing gist {} ({} file changes)", gist_id, changes.len());

        // Diff the requested change set against the files the gist has:
        // update what exists, delete what was nulled, create the rest.
        let mut ops: Vec<BoxFuture<'_, Result<Option<GitLabSnippet>>>> = Vec::new();
        for (filename, change) in changes {
            match (existing.files.get(filename.as_str()), change) {
                (Some(file), None) => {
                    let snippet_id =
                        file.id.ok_or_else(|| BridgeError::MissingSnippetId {
                            filename: filename.clone(),
                        })?;
                    ops.push(
                        async move {
                            self.delete_snippet(token, project_id, snippet_id)
                                .await
                                .map(|()| None)
                        }
                        .boxed(),
                    );
                }
                (Some(file), Some(content)) => {
                    let snippet_id =
                        file.id.ok_or_else(|| BridgeError::MissingSnippetId {
                            filename: filename.clone(),
                        })?;
                    ops.push(
                        async move {
                            self.update_snippet(
                                token,
                                project_id,
                                snippet_id,
                                &existing.id,
                                description,
                                filename,
                                content,
                            )
                            .await
                            .map(Some)
                        }
                        .boxed(),
                    );
                }
                (None, Some(content)) => {
                    ops.push(
                        async move {
                            self.create_snippet(
                                token,
                                project_id,
                                &existing.id,
                                description,
                                filename,
                                content,
                                false,
                            )
                            .await
                            .map(Some)
                        }
                        .boxed(),
                    );
                }
                // Deleting a file the gist never had is a no-op.
                (None, None) => {}
            }
        }

        let results = try_join_all(ops).await?;
        let survivors: Vec<GitLabSnippet> = results.into_iter().flatten().collect();

        if survivors.is_empty() {
            // Every touched file was deleted; keep the metadata around so the
            // caller can still identify the gist.
            let mut gist = existing.clone();
            gist.description = description.to_string();
            gist.files.clear();
            return Ok(gist);
        }

        let gist = group_snippets(survivors)
            .into_iter()
            .next()
            .ok_or(BridgeError::EmptyFileSet)?;
        self.fill_contents(token, project_id, gist).await
    }

    async fn delete_single_gist(&self, token: &str, gist: &Gist) -> Result<()> {
        let project_id = gist
            .project_id
            .ok_or_else(|| BridgeError::MissingProjectId {
                id: gist.id.clone(),
            })?;

        tracing::debug!("deleting gist {} ({} files)", gist.id, gist.files.len());
        let deletes: Vec<_> = gist
            .files
            .values()
            .map(|file| {
                let snippet_id = file.id.ok_or_else(|| BridgeError::MissingSnippetId {
                    filename: file.filename.clone(),
                })?;
                Ok(self.delete_snippet(token, project_id, snippet_id))
            })
            .collect::<Result<Vec<_>>>()?;

        try_join_all(deletes).await?;
        Ok(())
    }
}
