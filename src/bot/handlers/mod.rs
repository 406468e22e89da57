use std::sync::Arc;

use tracing::Instrument;

use crate::bot::event::BotEvent;
use crate::bot::handlers::refresh::refresh_repository;
use crate::bot::handlers::response::handle_author_comment;
use crate::bot::handlers::review::handle_review_submitted;
use crate::bot::{BotState, RepositoryClient, RepositoryState, SettleDelay};
use crate::github::{GithubRepoName, PullRequest, PullRequestNumber};
use crate::utils::logging::LogError;

mod assignment;
mod refresh;
mod response;
mod review;

/// This function executes a single bot event.
/// Errors of the individual handlers are logged in the span of the event, so that one failing
/// event does not affect the others.
pub async fn handle_bot_event<Client: RepositoryClient>(
    event: BotEvent,
    state: Arc<dyn BotState<Client>>,
) -> anyhow::Result<()> {
    match event {
        BotEvent::ReviewSubmitted(review) => {
            let Some(repo) = get_repo_state(state.as_ref(), &review.repository) else {
                return Ok(());
            };
            let span = tracing::info_span!(
                "Review submitted",
                pr = format!("{}#{}", review.repository, review.pr_number),
                reviewer = review.reviewer.username,
                verdict = ?review.verdict
            );
            if let Err(error) = handle_review_submitted(repo, review)
                .instrument(span.clone())
                .await
            {
                span.log_error(error);
            }
        }
        BotEvent::Comment(comment) => {
            let Some(repo) = get_repo_state(state.as_ref(), &comment.repository) else {
                return Ok(());
            };
            let span = tracing::info_span!(
                "Comment",
                pr = format!(
                    "{}#{}",
                    comment.repository,
                    comment
                        .pr_number
                        .map(|pr| pr.to_string())
                        .unwrap_or_else(|| "<issue>".to_string())
                ),
                author = comment.author.username
            );
            if let Err(error) = handle_author_comment(repo, comment)
                .instrument(span.clone())
                .await
            {
                span.log_error(error);
            }
        }
        BotEvent::InstallationsChanged => {
            let span = tracing::info_span!("Installations changed");
            span.in_scope(|| tracing::info!("Reloading installation repositories"));
            if let Err(error) = state.reload_repositories().instrument(span.clone()).await {
                span.log_error(error);
            }
        }
        BotEvent::Refresh => {
            let span = tracing::info_span!("Refresh");
            let repos = state.get_all_repos();
            futures::future::join_all(repos.into_iter().map(|repo| async move {
                let subspan = tracing::info_span!("Repo", repo = repo.repository.to_string());
                if let Err(error) = refresh_repository(repo).instrument(subspan.clone()).await {
                    subspan.log_error(error);
                }
            }))
            .instrument(span)
            .await;
        }
    }
    Ok(())
}

fn get_repo_state<Client: RepositoryClient>(
    state: &dyn BotState<Client>,
    repo: &GithubRepoName,
) -> Option<Arc<RepositoryState<Client>>> {
    let repo_state = state.get_repo_state(repo);
    if repo_state.is_none() {
        tracing::warn!("Repository {repo} not found");
    }
    repo_state
}

/// Waits for the PR state to settle and then downloads a fresh snapshot of it.
/// Returns `None` if the PR has been closed in the meantime.
async fn settle_and_fetch<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    pr: PullRequestNumber,
) -> anyhow::Result<Option<PullRequest>> {
    let delay = SettleDelay::new(repo.config.load().settle_delay);
    delay.wait().await;

    let pr = repo.client.get_pull_request(pr).await?;
    if pr.is_closed() {
        tracing::info!("PR #{} is closed, nothing to do", pr.number);
        return Ok(None);
    }
    Ok(Some(pr))
}
