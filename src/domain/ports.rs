use crate::backends::Provider;
use crate::domain::model::{AccessToken, FileChanges, Gist, NewFiles, UserProfile};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The unified surface the application talks to; one implementation per
/// hosted backend.
///
/// Every operation performs one or more HTTP calls against the provider and
/// reshapes the response into the common [`Gist`]/[`Snippet`] model. Failures
/// propagate undecorated except for listing, which falls back to legacy
/// pagination internally.
///
/// [`Snippet`]: crate::domain::model::Snippet
#[async_trait]
pub trait GistBackend: std::fmt::Debug + Send + Sync {
    /// Which provider this backend talks to.
    fn provider(&self) -> Provider;

    /// Exchange an OAuth web-flow code for an access token.
    ///
    /// GitLab authenticates with personal tokens and reports this operation
    /// as unsupported.
    async fn exchange_access_token(&self, code: &str) -> Result<AccessToken>;

    /// Look up the authenticated user. On GitLab this also resolves the
    /// configured snippet project to its numeric id.
    async fn get_user_profile(&self, token: &str) -> Result<UserProfile>;

    /// List every gist visible to `profile`, grouped into the common model.
    async fn get_all_gists(&self, token: &str, profile: &UserProfile) -> Result<Vec<Gist>>;

    /// Fill the file contents of one gist from a listing brief.
    async fn get_single_gist(&self, token: &str, gist_id: &str, brief: &Gist) -> Result<Gist>;

    /// Create a gist from a filename-to-content map.
    async fn create_single_gist(
        &self,
        token: &str,
        profile: &UserProfile,
        description: &str,
        files: &NewFiles,
        public: bool,
    ) -> Result<Gist>;

    /// Apply a per-file change set against an existing gist.
    ///
    /// A `Some(content)` entry updates the file if `existing` has it and
    /// creates it otherwise; a `None` entry deletes it. The returned gist
    /// reflects the provider's post-edit view.
    async fn edit_single_gist(
        &self,
        token: &str,
        gist_id: &str,
        description: &str,
        changes: &FileChanges,
        existing: &Gist,
    ) -> Result<Gist>;

    /// Delete a gist and every remote snippet belonging to it.
    async fn delete_single_gist(&self, token: &str, gist: &Gist) -> Result<()>;
}
