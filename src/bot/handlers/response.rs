use std::sync::Arc;

use crate::bot::comment::rereview_requested_comment;
use crate::bot::event::IssueComment;
use crate::bot::handlers::assignment::{assign_new_reviewers, unassign_user};
use crate::bot::handlers::settle_and_fetch;
use crate::bot::labels::{extract_mentioned_users, is_review_request};
use crate::bot::{RepositoryClient, RepositoryState};

/// Hands the PR back to the reviewers when its author asks them to take another look.
pub(super) async fn handle_author_comment<Client: RepositoryClient>(
    repo: Arc<RepositoryState<Client>>,
    comment: IssueComment,
) -> anyhow::Result<()> {
    let Some(pr_number) = comment.pr_number else {
        tracing::debug!("Ignoring comment on an issue");
        return Ok(());
    };
    if !comment.author.is(&comment.issue_author.username) {
        tracing::debug!("Ignoring comment that was not written by the PR author");
        return Ok(());
    }
    if !is_review_request(&comment.text) {
        tracing::trace!("Comment does not ask for a review");
        return Ok(());
    }

    let Some(pr) = settle_and_fetch(&repo, pr_number).await? else {
        return Ok(());
    };

    let mentioned = extract_mentioned_users(&comment.text);
    assign_new_reviewers(&repo.client, &pr, &mentioned).await?;

    let author = &pr.author.username;
    if pr.is_assigned(author) {
        unassign_user(
            &repo.client,
            pr.number,
            author,
            rereview_requested_comment(author),
        )
        .await?;
    }
    Ok(())
}
