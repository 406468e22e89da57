use crate::bot::comment::assign_reviewers_comment;
use crate::bot::{Comment, RepositoryClient};
use crate::github::{PullRequest, PullRequestNumber};
use crate::utils::text::pluralize;

/// Assigns `users` and announces it with a single comment.
pub(super) async fn assign_users<Client: RepositoryClient>(
    client: &Client,
    pr: PullRequestNumber,
    users: &[String],
    comment: Comment,
) -> anyhow::Result<()> {
    tracing::info!(
        "Assigning {} {}",
        pluralize("user", users.len()),
        users.join(", ")
    );
    client.add_assignees(pr, users).await?;
    client.post_comment(pr, comment).await
}

pub(super) async fn unassign_user<Client: RepositoryClient>(
    client: &Client,
    pr: PullRequestNumber,
    user: &str,
    comment: Comment,
) -> anyhow::Result<()> {
    tracing::info!("Unassigning {user}");
    client.remove_assignees(pr, &[user.to_string()]).await?;
    client.post_comment(pr, comment).await
}

/// Assigns those of `users` that are not assigned yet, with one comment listing only them.
pub(super) async fn assign_new_reviewers<Client: RepositoryClient>(
    client: &Client,
    pr: &PullRequest,
    users: &[String],
) -> anyhow::Result<()> {
    let new_users: Vec<String> = users
        .iter()
        .filter(|user| !pr.is_assigned(user))
        .cloned()
        .collect();
    if new_users.is_empty() {
        tracing::debug!("Everybody from {users:?} is already assigned");
        return Ok(());
    }
    let comment = assign_reviewers_comment(&new_users);
    assign_users(client, pr.number, &new_users, comment).await
}
