use std::str::FromStr;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::bot::event::{BotEvent, IssueComment, PullRequestReview};
use crate::github::payload::{IssueCommentEventPayload, PullRequestReviewEventPayload};
use crate::github::{GithubUser, PullRequestNumber, ReviewVerdict};

/// Webhook payloads larger than this are rejected.
const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub BotEvent);

/// Extracts a webhook event from a HTTP request.
///
/// Events that the bot does not react to are rejected with `200 OK`, so that GitHub does not
/// consider their delivery as failed.
#[async_trait]
impl<S> FromRequest<S> for GitHubWebhook
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_BODY_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Parse webhook content
        match parse_webhook_event(parts, &body) {
            Ok(Some(event)) => {
                tracing::trace!("Webhook: {event:?}");
                Ok(GitHubWebhook(event))
            }
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(request: Parts, body: &[u8]) -> anyhow::Result<Option<BotEvent>> {
    let Some(event_type) = request.headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match event_type.as_bytes() {
        b"pull_request_review" => {
            let payload: PullRequestReviewEventPayload = serde_json::from_slice(body)?;
            Ok(parse_review(payload).map(BotEvent::ReviewSubmitted))
        }
        b"issue_comment" => {
            let payload: IssueCommentEventPayload = serde_json::from_slice(body)?;
            Ok(parse_comment(payload).map(BotEvent::Comment))
        }
        b"installation_repositories" | b"installation" => Ok(Some(BotEvent::InstallationsChanged)),
        _ => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

fn parse_review(payload: PullRequestReviewEventPayload) -> Option<PullRequestReview> {
    if payload.action != "submitted" {
        tracing::debug!("Ignoring review with action {}", payload.action);
        return None;
    }
    let Some(reviewer) = payload.review.user else {
        tracing::debug!("Ignoring review without an author");
        return None;
    };
    let verdict = match ReviewVerdict::from_str(&payload.review.state) {
        Ok(verdict) => verdict,
        Err(error) => {
            tracing::debug!("Ignoring review: {error}");
            return None;
        }
    };

    Some(PullRequestReview {
        repository: payload.repository.repo_name(),
        pr_number: PullRequestNumber(payload.pull_request.number),
        reviewer: GithubUser::new(&reviewer.login),
        verdict,
    })
}

fn parse_comment(payload: IssueCommentEventPayload) -> Option<IssueComment> {
    if payload.action != "created" {
        tracing::debug!("Ignoring comment with action {}", payload.action);
        return None;
    }

    let pr_number = payload
        .issue
        .pull_request
        .is_some()
        .then_some(PullRequestNumber(payload.issue.number));
    Some(IssueComment {
        repository: payload.repository.repo_name(),
        pr_number,
        author: GithubUser::new(&payload.comment.user.login),
        issue_author: GithubUser::new(&payload.issue.user.login),
        text: payload.comment.body.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{HeaderValue, Method, Request, StatusCode};

    use crate::bot::event::BotEvent;
    use crate::github::webhook::GitHubWebhook;
    use crate::github::ReviewVerdict;
    use crate::tests::io::load_test_file;

    #[tokio::test]
    async fn review_approved() {
        insta::assert_debug_snapshot!(
            check_webhook("webhook/review-approved.json", "pull_request_review").await,
            @r###"
        Ok(
            GitHubWebhook(
                ReviewSubmitted(
                    PullRequestReview {
                        repository: GithubRepoName {
                            owner: "oppia",
                            name: "oppia",
                        },
                        pr_number: PullRequestNumber(
                            18234,
                        ),
                        reviewer: GithubUser {
                            username: "seanlip",
                        },
                        verdict: Approved,
                    },
                ),
            ),
        )
        "###
        );
    }

    #[tokio::test]
    async fn review_commented() {
        let event = check_webhook("webhook/review-commented.json", "pull_request_review").await;
        assert!(matches!(
            event,
            Ok(GitHubWebhook(BotEvent::ReviewSubmitted(review)))
                if review.verdict == ReviewVerdict::Commented
        ));
    }

    #[tokio::test]
    async fn review_edited_is_ignored() {
        assert_eq!(
            check_webhook("webhook/review-edited.json", "pull_request_review")
                .await
                .unwrap_err(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn comment_on_pull_request() {
        insta::assert_debug_snapshot!(
            check_webhook("webhook/issue-comment-pr.json", "issue_comment").await,
            @r###"
        Ok(
            GitHubWebhook(
                Comment(
                    IssueComment {
                        repository: GithubRepoName {
                            owner: "oppia",
                            name: "oppia",
                        },
                        pr_number: Some(
                            PullRequestNumber(
                                18234,
                            ),
                        ),
                        author: GithubUser {
                            username: "Alice-Dev",
                        },
                        issue_author: GithubUser {
                            username: "Alice-Dev",
                        },
                        text: "@seanlip @aks681 PTAL!",
                    },
                ),
            ),
        )
        "###
        );
    }

    #[tokio::test]
    async fn comment_on_issue() {
        let event = check_webhook("webhook/issue-comment-issue.json", "issue_comment").await;
        assert!(matches!(
            event,
            Ok(GitHubWebhook(BotEvent::Comment(comment))) if comment.pr_number.is_none()
        ));
    }

    #[tokio::test]
    async fn installation_changed() {
        assert!(matches!(
            check_webhook("webhook/installation.json", "installation").await,
            Ok(GitHubWebhook(BotEvent::InstallationsChanged))
        ));
        assert!(matches!(
            check_webhook("webhook/installation.json", "installation_repositories").await,
            Ok(GitHubWebhook(BotEvent::InstallationsChanged))
        ));
    }

    #[tokio::test]
    async fn unknown_event() {
        assert_eq!(
            check_webhook("webhook/push.json", "push")
                .await
                .unwrap_err(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn missing_event_header() {
        let request = Request::builder()
            .method(Method::POST)
            .body(Body::from("{}"))
            .unwrap();
        assert_eq!(
            GitHubWebhook::from_request(request, &()).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn malformed_payload() {
        let request = Request::builder()
            .method(Method::POST)
            .header("x-github-event", "pull_request_review")
            .body(Body::from(r#"{"action": "submitted"}"#))
            .unwrap();
        assert_eq!(
            GitHubWebhook::from_request(request, &()).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    async fn check_webhook(file: &str, event: &str) -> Result<GitHubWebhook, StatusCode> {
        let body = load_test_file(file);
        let body_length = body.len();

        let mut request = Request::new(Body::from(body));
        *request.method_mut() = Method::POST;
        let headers = request.headers_mut();
        headers.insert("content-type", HeaderValue::from_static("application-json"));
        headers.insert(
            "content-length",
            HeaderValue::from_str(&body_length.to_string()).unwrap(),
        );
        headers.insert("x-github-event", HeaderValue::from_str(event).unwrap());
        GitHubWebhook::from_request(request, &()).await
    }
}
