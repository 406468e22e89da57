use std::sync::Arc;

use crate::bot::classify::{determine_review_status, ReviewStatus};
use crate::bot::comment::{
    already_approved_comment, changes_requested_comment, lgtm_removed_comment,
    ready_to_merge_author_comment, ready_to_merge_owner_comment, review_done_comment,
};
use crate::bot::event::PullRequestReview;
use crate::bot::handlers::assignment::{assign_new_reviewers, assign_users, unassign_user};
use crate::bot::handlers::settle_and_fetch;
use crate::bot::labels::{extract_changelog_owner, has_lgtm_label};
use crate::bot::{OrchestrationError, RepositoryClient, RepositoryState};
use crate::github::{GithubUser, PullRequest, ReviewVerdict};
use crate::permissions::can_merge;

/// Reacts to a submitted review by moving reviewers, author and labels towards the next step
/// of the review process.
pub(super) async fn handle_review_submitted<Client: RepositoryClient>(
    repo: Arc<RepositoryState<Client>>,
    review: PullRequestReview,
) -> anyhow::Result<()> {
    if review.verdict == ReviewVerdict::Commented {
        tracing::debug!("Ignoring review without a verdict");
        return Ok(());
    }

    let Some(pr) = settle_and_fetch(&repo, review.pr_number).await? else {
        return Ok(());
    };

    match review.verdict {
        ReviewVerdict::ChangesRequested => changes_requested(&repo, &pr, &review.reviewer).await,
        ReviewVerdict::Approved => approved(&repo, &pr, &review.reviewer).await,
        ReviewVerdict::Commented => Ok(()),
    }
}

async fn changes_requested<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    pr: &PullRequest,
    reviewer: &GithubUser,
) -> anyhow::Result<()> {
    let client = &repo.client;
    if pr.is_assigned(&reviewer.username) {
        unassign_user(
            client,
            pr.number,
            &reviewer.username,
            review_done_comment(&reviewer.username),
        )
        .await?;
    }

    let author = &pr.author.username;
    if !pr.is_assigned(author) {
        assign_users(
            client,
            pr.number,
            &[author.clone()],
            changes_requested_comment(author, &reviewer.username),
        )
        .await?;
    }

    // Requested changes invalidate any earlier approval.
    let labels = repo.config.load_full().labels.clone();
    if has_lgtm_label(&pr.labels, &labels) {
        let lgtm = labels.lgtm;
        tracing::info!("Removing label {lgtm}");
        client.remove_labels(pr.number, &[lgtm.clone()]).await?;
        client
            .post_comment(pr.number, lgtm_removed_comment(&lgtm))
            .await?;
    }
    Ok(())
}

async fn approved<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    pr: &PullRequest,
    reviewer: &GithubUser,
) -> anyhow::Result<()> {
    if pr.is_assigned(&reviewer.username) {
        unassign_user(
            &repo.client,
            pr.number,
            &reviewer.username,
            already_approved_comment(&reviewer.username),
        )
        .await?;
    }

    match determine_review_status(&repo.client, pr).await? {
        ReviewStatus::PendingReviews => {
            assign_new_reviewers(&repo.client, pr, &pr.requested_reviewers).await
        }
        ReviewStatus::ChangesRequested => {
            // The author was notified when the changes were requested.
            tracing::info!("Some reviewer still requests changes");
            Ok(())
        }
        ReviewStatus::ApprovedByAll => approval_complete(repo, pr).await,
        ReviewStatus::Undetermined => {
            tracing::info!("PR is neither pending, changes requested nor approved, skipping");
            Ok(())
        }
    }
}

/// Marks the PR as approved and hands it over to someone who can merge it.
///
/// That is the author when they are a member of the organization, otherwise the project owner
/// named by the changelog label.
pub(super) async fn approval_complete<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    pr: &PullRequest,
) -> anyhow::Result<()> {
    let config = repo.config.load_full();
    let client = &repo.client;

    let lgtm = &config.labels.lgtm;
    if !has_lgtm_label(&pr.labels, &config.labels) {
        tracing::info!("Adding label {lgtm}");
        client.add_labels(pr.number, &[lgtm.clone()]).await?;
    }

    let organization = config
        .organization
        .as_deref()
        .unwrap_or(repo.repository.owner());
    let author = &pr.author.username;
    if can_merge(client, organization, author).await {
        return assign_users(
            client,
            pr.number,
            &[author.clone()],
            ready_to_merge_author_comment(author),
        )
        .await;
    }

    let Some(owner) = extract_changelog_owner(&pr.labels, &config.labels) else {
        return Err(OrchestrationError::MissingChangelogOwner { pr: pr.number }.into());
    };
    let comment = ready_to_merge_owner_comment(&owner);
    assign_users(client, pr.number, &[owner], comment).await
}
