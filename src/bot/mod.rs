use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::async_trait;

use crate::config::RepositoryConfig;
use crate::github::{GithubRepoName, PullRequest, PullRequestNumber, Review};

mod classify;
mod comment;
mod error;
pub mod event;
mod handlers;
mod labels;
mod process;
mod settle;

pub use classify::{ReviewHistory, ReviewStatus};
pub use comment::Comment;
pub use error::OrchestrationError;
pub use handlers::handle_bot_event;
pub use labels::{extract_changelog_owner, extract_mentioned_users, is_review_request};
pub use process::create_bot_process;
pub use settle::SettleDelay;

/// Provides functionality for working with a remote repository.
///
/// Adding a label or an assignee that is already present, and removing one that is missing,
/// must be a no-op rather than an error.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    fn repository(&self) -> &GithubRepoName;

    /// Load the repository config.
    async fn load_config(&self) -> anyhow::Result<RepositoryConfig>;

    /// Resolve a pull request from this repository by its number.
    async fn get_pull_request(&self, pr: PullRequestNumber) -> anyhow::Result<PullRequest>;

    /// Return all pull requests that are currently open.
    async fn get_open_pull_requests(&self) -> anyhow::Result<Vec<PullRequest>>;

    /// Return all submitted reviews of a pull request, oldest first.
    async fn get_reviews(&self, pr: PullRequestNumber) -> anyhow::Result<Vec<Review>>;

    async fn add_assignees(&self, pr: PullRequestNumber, users: &[String]) -> anyhow::Result<()>;

    async fn remove_assignees(&self, pr: PullRequestNumber, users: &[String])
        -> anyhow::Result<()>;

    /// Add a set of labels to a PR.
    async fn add_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()>;

    /// Remove a set of labels from a PR.
    async fn remove_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()>;

    /// Post a comment to the pull request with the given number.
    /// Every call creates a new comment.
    async fn post_comment(&self, pr: PullRequestNumber, comment: Comment) -> anyhow::Result<()>;

    /// Is `username` a member of the organization `org`?
    async fn is_org_member(&self, org: &str, username: &str) -> anyhow::Result<bool>;
}

/// Main state holder for the bot.
/// It is behind a trait to allow easier mocking in tests.
#[async_trait]
pub trait BotState<Client: RepositoryClient>: Send + Sync {
    /// Get state for the given repository name.
    fn get_repo_state(&self, repo: &GithubRepoName) -> Option<Arc<RepositoryState<Client>>>;

    /// Get all repositories.
    fn get_all_repos(&self) -> Vec<Arc<RepositoryState<Client>>>;

    /// Reload state of repositories due to some external change.
    async fn reload_repositories(&self) -> anyhow::Result<()>;
}

/// An access point to a single repository.
/// Holds the configuration of the repository and a client that performs actions on it.
pub struct RepositoryState<Client: RepositoryClient> {
    pub repository: GithubRepoName,
    pub client: Client,
    pub config: ArcSwap<RepositoryConfig>,
}
