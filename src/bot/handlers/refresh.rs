use std::sync::Arc;

use tracing::Instrument;

use crate::bot::classify::{determine_review_status, ReviewStatus};
use crate::bot::comment::{
    changes_requested_reminder_comment, needs_assistance_comment, ready_to_merge_ask_reviewer_comment,
};
use crate::bot::handlers::assignment::{assign_new_reviewers, assign_users};
use crate::bot::handlers::review::approval_complete;
use crate::bot::{OrchestrationError, RepositoryClient, RepositoryState};
use crate::github::PullRequest;
use crate::utils::logging::LogError;
use crate::utils::text::pluralize;

/// Reloads the configuration of the repository and makes sure that every open PR has
/// somebody assigned to it.
pub(super) async fn refresh_repository<Client: RepositoryClient>(
    repo: Arc<RepositoryState<Client>>,
) -> anyhow::Result<()> {
    match repo.client.load_config().await {
        Ok(config) => repo.config.store(Arc::new(config)),
        Err(error) => {
            tracing::error!("Cannot reload config, keeping the previous one: {error:?}");
        }
    }
    ensure_pull_requests_assigned(&repo).await
}

async fn ensure_pull_requests_assigned<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
) -> anyhow::Result<()> {
    let unassigned: Vec<PullRequest> = repo
        .client
        .get_open_pull_requests()
        .await?
        .into_iter()
        .filter(|pr| pr.assignees.is_empty())
        .collect();
    tracing::info!(
        "Found {} unassigned {}",
        unassigned.len(),
        pluralize("pull request", unassigned.len())
    );

    for pr in unassigned {
        let span = tracing::info_span!("Unassigned PR", pr = pr.number.0);
        if let Err(error) = ensure_assigned(repo, &pr).instrument(span.clone()).await {
            span.log_error(error);
        }
    }
    Ok(())
}

async fn ensure_assigned<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    pr: &PullRequest,
) -> anyhow::Result<()> {
    let client = &repo.client;
    let status = determine_review_status(client, pr).await?;
    tracing::debug!("Review status: {status:?}");

    match status {
        ReviewStatus::PendingReviews => {
            assign_new_reviewers(client, pr, &pr.requested_reviewers).await
        }
        ReviewStatus::ChangesRequested => {
            let author = &pr.author.username;
            assign_users(
                client,
                pr.number,
                &[author.clone()],
                changes_requested_reminder_comment(author),
            )
            .await
        }
        ReviewStatus::ApprovedByAll => match approval_complete(repo, pr).await {
            // Nobody else can merge it, so the PR goes back to its author.
            Err(error)
                if matches!(
                    error.downcast_ref::<OrchestrationError>(),
                    Some(OrchestrationError::MissingChangelogOwner { .. })
                ) =>
            {
                let author = &pr.author.username;
                tracing::info!("PR #{} has no changelog owner, assigning {author}", pr.number);
                assign_users(
                    client,
                    pr.number,
                    &[author.clone()],
                    ready_to_merge_ask_reviewer_comment(author),
                )
                .await
            }
            result => result,
        },
        ReviewStatus::Undetermined => {
            let Some(assignee) = repo.config.load().fallback_assignee.clone() else {
                tracing::warn!(
                    "PR #{} needs assistance, but no fallback assignee is configured",
                    pr.number
                );
                return Ok(());
            };
            let comment = needs_assistance_comment(&assignee);
            assign_users(client, pr.number, &[assignee], comment).await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RepositoryConfig;
    use crate::github::ReviewVerdict;
    use crate::tests::github::{labels, users, PRBuilder};
    use crate::tests::state::ClientBuilder;

    #[tokio::test]
    async fn assigned_prs_are_left_alone() {
        let state = ClientBuilder::default().create_state();
        state.client().set_pr(
            PRBuilder::default()
                .assignees(users(&["bob"]))
                .requested_reviewers(users(&["dave"]))
                .create(),
        );
        state.refresh().await;
        state.client().check_added_assignees(1, &[]);
        state.client().check_comments(1, &[]);
    }

    #[tokio::test]
    async fn pending_reviewers_are_assigned() {
        let state = ClientBuilder::default().create_state();
        state.client().set_pr(
            PRBuilder::default()
                .requested_reviewers(users(&["carol", "dave"]))
                .create(),
        );
        state.refresh().await;
        state.client().check_added_assignees(1, &["carol", "dave"]);
        state.client().check_comments(
            1,
            &["Assigning @carol, @dave for code owner reviews, Thanks!"],
        );
    }

    #[tokio::test]
    async fn author_is_reminded_of_requested_changes() {
        let state = ClientBuilder::default().create_state();
        state
            .client()
            .set_pr(PRBuilder::default().author("alice").create());
        state
            .client()
            .add_review(1, "bob", ReviewVerdict::ChangesRequested);
        state.refresh().await;
        state.client().check_added_assignees(1, &["alice"]);
        state.client().check_comments(
            1,
            &["Hi @alice, changes were requested on this pull request, PTAL. Thanks!"],
        );
    }

    #[tokio::test]
    async fn approved_pr_is_handed_over_for_merge() {
        let state = ClientBuilder::default().create_state();
        state.client().set_pr(
            PRBuilder::default()
                .author("frank")
                .labels(labels(&["PR CHANGELOG: Miscellaneous -- @ankita240796"]))
                .create(),
        );
        state.client().add_review(1, "erin", ReviewVerdict::Approved);
        state.refresh().await;
        state.client().check_added_labels(1, &["PR: LGTM"]);
        state.client().check_added_assignees(1, &["ankita240796"]);
    }

    #[tokio::test]
    async fn undetermined_pr_goes_to_fallback_assignee() {
        let state = ClientBuilder::default()
            .config(RepositoryConfig {
                fallback_assignee: Some("welfare-lead".to_string()),
                ..Default::default()
            })
            .create_state();
        state.refresh().await;
        state.client().check_added_assignees(1, &["welfare-lead"]);
        state.client().check_comments(
            1,
            &["Hi @welfare-lead, this pull request needs some assistance, PTAL. Thanks!"],
        );
    }

    #[tokio::test]
    async fn undetermined_pr_without_fallback_assignee() {
        let state = ClientBuilder::default().create_state();
        state.refresh().await;
        state.client().check_added_assignees(1, &[]);
        state.client().check_comments(1, &[]);
    }

    #[tokio::test]
    async fn failing_pr_does_not_stop_refresh() {
        let state = ClientBuilder::default().create_state();
        state
            .client()
            .set_pr(PRBuilder::default().number(1).author("frank").create());
        state.client().fail_review_fetch(1);
        state.client().set_pr(
            PRBuilder::default()
                .number(2)
                .requested_reviewers(users(&["dave"]))
                .create(),
        );
        state.refresh().await;
        state.client().check_added_assignees(1, &[]);
        state.client().check_added_assignees(2, &["dave"]);
    }

    #[tokio::test]
    async fn approved_pr_without_changelog_owner_goes_back_to_author() {
        let state = ClientBuilder::default().create_state();
        state
            .client()
            .set_pr(PRBuilder::default().author("frank").create());
        state.client().add_review(1, "erin", ReviewVerdict::Approved);
        state.refresh().await;
        state.refresh().await;
        state.client().check_added_labels(1, &["PR: LGTM"]);
        state.client().check_added_assignees(1, &["frank"]);
        state.client().check_comments(
            1,
            &["Hi @frank, this PR is ready to be merged. Please ask one of the reviewers to help with the merge, also, make sure there are no pending comments before merge. Thanks!"],
        );
        assert_eq!(state.client().pr(1).assignees, users(&["frank"]));
    }

    #[tokio::test]
    async fn refresh_reloads_config() {
        let state = ClientBuilder::default().create_state();
        state.client().set_config(RepositoryConfig {
            fallback_assignee: Some("welfare-lead".to_string()),
            ..Default::default()
        });
        state.refresh().await;
        assert_eq!(
            state.repo_state().config.load().fallback_assignee.as_deref(),
            Some("welfare-lead")
        );
        state.client().check_added_assignees(1, &["welfare-lead"]);
    }
}
