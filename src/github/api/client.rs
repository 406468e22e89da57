use std::future::Future;

use anyhow::Context;
use axum::async_trait;
use octocrab::{Error, Octocrab};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bot::{Comment, RepositoryClient};
use crate::config::RepositoryConfig;
use crate::github::api::operations::{check_org_membership, load_repository_config};
use crate::github::payload::{PullRequestPayload, ReviewPayload};
use crate::github::{GithubRepoName, PullRequest, PullRequestNumber, Review};
use crate::utils::timing::{perform_retryable, RetryMethod};

const PAGE_SIZE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
}

/// Provides access to a single app installation (repository) using the GitHub API.
pub struct GithubRepositoryClient {
    /// The client caches the access token for this given repository and refreshes it once it
    /// expires.
    client: Octocrab,
    repo_name: GithubRepoName,
}

impl GithubRepositoryClient {
    pub fn new(client: Octocrab, repo_name: GithubRepoName) -> Self {
        Self { client, repo_name }
    }

    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    fn format_pr(&self, pr: PullRequestNumber) -> String {
        format!("{}#{}", self.repo_name, pr)
    }

    /// Routes are relative, octocrab resolves them against its base URI.
    fn url(&self, path: &str) -> String {
        format!(
            "/repos/{}/{}{path}",
            self.repo_name.owner(),
            self.repo_name.name()
        )
    }

    /// Reads are retried on errors and timeouts.
    async fn with_retry<T, F, Fut>(&self, operation: &str, func: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let result =
            perform_retryable::<T, anyhow::Error, _, _, _>(operation, RetryMethod::default(), func)
                .await?;
        Ok(result)
    }

    /// Mutations and membership checks are performed at most once, with a timeout.
    async fn single_attempt<T, F, Fut>(&self, operation: &str, func: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let result =
            perform_retryable::<T, anyhow::Error, _, _, _>(operation, RetryMethod::no_retry(), func)
                .await?;
        Ok(result)
    }

    /// Reads all pages of a list endpoint.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        state: Option<&'static str>,
    ) -> anyhow::Result<Vec<T>> {
        let mut items = Vec::new();
        for page in 1.. {
            let params = PageParams {
                per_page: PAGE_SIZE,
                page,
                state,
            };
            let batch: Vec<T> = self
                .client
                .get(url, Some(&params))
                .await
                .with_context(|| format!("Cannot load page {page} of {url}"))?;
            let last_page = batch.len() < PAGE_SIZE as usize;
            items.extend(batch);
            if last_page {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl RepositoryClient for GithubRepositoryClient {
    fn repository(&self) -> &GithubRepoName {
        &self.repo_name
    }

    async fn load_config(&self) -> anyhow::Result<RepositoryConfig> {
        self.with_retry("load_config", || async {
            load_repository_config(self).await
        })
        .await
    }

    async fn get_pull_request(&self, pr: PullRequestNumber) -> anyhow::Result<PullRequest> {
        // https://docs.github.com/en/rest/pulls/pulls?apiVersion=2022-11-28#get-a-pull-request
        let url = self.url(&format!("/pulls/{pr}"));
        let payload = self.with_retry("get_pull_request", || async {
            self.client
                .get::<PullRequestPayload, _, ()>(&url, None)
                .await
                .with_context(|| format!("Could not get PR {}", self.format_pr(pr)))
        })
        .await?;
        Ok(payload.into())
    }

    async fn get_open_pull_requests(&self) -> anyhow::Result<Vec<PullRequest>> {
        // https://docs.github.com/en/rest/pulls/pulls?apiVersion=2022-11-28#list-pull-requests
        let url = self.url("/pulls");
        let prs = self
            .with_retry("get_open_pull_requests", || async {
                self.get_all_pages::<PullRequestPayload>(&url, Some("open"))
                    .await
            })
            .await?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn get_reviews(&self, pr: PullRequestNumber) -> anyhow::Result<Vec<Review>> {
        // https://docs.github.com/en/rest/pulls/reviews?apiVersion=2022-11-28#list-reviews-for-a-pull-request
        let url = self.url(&format!("/pulls/{pr}/reviews"));
        let reviews = self.with_retry("get_reviews", || async {
            self.get_all_pages::<ReviewPayload>(&url, None).await
        })
        .await?;

        // Reviews are returned in chronological order.
        Ok(reviews
            .into_iter()
            .filter_map(|review| {
                let reviewer = review.user?.login;
                match review.state.parse() {
                    Ok(verdict) => Some(Review { reviewer, verdict }),
                    Err(error) => {
                        tracing::trace!("Skipping review of {reviewer}: {error}");
                        None
                    }
                }
            })
            .collect())
    }

    async fn add_assignees(&self, pr: PullRequestNumber, users: &[String]) -> anyhow::Result<()> {
        if users.is_empty() {
            return Ok(());
        }
        // https://docs.github.com/en/rest/issues/assignees?apiVersion=2022-11-28#add-assignees-to-an-issue
        let url = self.url(&format!("/issues/{pr}/assignees"));
        let body = serde_json::json!({ "assignees": users });
        self.single_attempt("add_assignees", || async {
            let issue: serde_json::Value = self
                .client
                .post(&url, Some(&body))
                .await
                .with_context(|| format!("Cannot assign {users:?} to {}", self.format_pr(pr)))?;
            Ok(issue)
        })
        .await?;
        Ok(())
    }

    async fn remove_assignees(
        &self,
        pr: PullRequestNumber,
        users: &[String],
    ) -> anyhow::Result<()> {
        if users.is_empty() {
            return Ok(());
        }
        // https://docs.github.com/en/rest/issues/assignees?apiVersion=2022-11-28#remove-assignees-from-an-issue
        let url = self.url(&format!("/issues/{pr}/assignees"));
        let body = serde_json::json!({ "assignees": users });
        self.single_attempt("remove_assignees", || async {
            self.client
                .delete::<serde_json::Value, _, _>(&url, Some(&body))
                .await
                .with_context(|| format!("Cannot unassign {users:?} from {}", self.format_pr(pr)))
        })
        .await?;
        Ok(())
    }

    async fn add_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        self.single_attempt("add_labels", || async {
            self.client
                .issues(self.repo_name.owner(), self.repo_name.name())
                .add_labels(pr.0, labels)
                .await
                .context("Cannot add label(s) to PR")
        })
        .await?;
        Ok(())
    }

    async fn remove_labels(
        &self,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        let client = self
            .client
            .issues(self.repo_name.owner(), self.repo_name.name());
        self.single_attempt("remove_labels", || async {
            // The GitHub API only allows removing labels one by one, so we remove all of them in
            // parallel to speed it up a little.
            let futures = labels.iter().map(|label| client.remove_label(pr.0, label));
            futures::future::join_all(futures)
                .await
                .into_iter()
                .filter(|result| match result {
                    Ok(_) => false,
                    // Removing a label that is not on the issue is a no-op.
                    Err(Error::GitHub { source, .. })
                        if source.message.contains("Label does not exist") =>
                    {
                        tracing::trace!("Trying to remove label which does not exist on PR {pr}");
                        false
                    }
                    Err(_) => true,
                })
                .collect::<Result<Vec<_>, _>>()
                .context("Cannot remove label(s) from PR")
        })
        .await?;
        Ok(())
    }

    /// The comment will be posted as the Github App user of the bot.
    async fn post_comment(&self, pr: PullRequestNumber, comment: Comment) -> anyhow::Result<()> {
        let text = comment.render();
        self.single_attempt("post_comment", || async {
            self.client
                .issues(self.repo_name.owner(), self.repo_name.name())
                .create_comment(pr.0, text)
                .await
                .with_context(|| format!("Cannot post comment to {}", self.format_pr(pr)))
        })
        .await?;
        Ok(())
    }

    async fn is_org_member(&self, org: &str, username: &str) -> anyhow::Result<bool> {
        self.single_attempt("is_org_member", || async {
            check_org_membership(self, org, username).await
        })
        .await
    }
}
