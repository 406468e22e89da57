//! Subsets of GitHub REST and webhook payloads that the bot reads.
//! Only the fields we use are declared, so that unrelated schema changes do not break parsing.
use serde::Deserialize;

use crate::github::{GithubRepoName, GithubUser, PullRequest, PullRequestNumber, PullRequestState};

#[derive(Deserialize, Debug)]
pub struct UserPayload {
    pub login: String,
}

#[derive(Deserialize, Debug)]
pub struct LabelPayload {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct RepositoryPayload {
    pub name: String,
    pub owner: UserPayload,
}

impl RepositoryPayload {
    pub fn repo_name(&self) -> GithubRepoName {
        GithubRepoName::new(&self.owner.login, &self.name)
    }
}

#[derive(Deserialize, Debug)]
pub struct PullRequestPayload {
    pub number: u64,
    pub user: UserPayload,
    pub state: String,
    #[serde(default)]
    pub assignees: Vec<UserPayload>,
    #[serde(default)]
    pub requested_reviewers: Vec<UserPayload>,
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
}

impl From<PullRequestPayload> for PullRequest {
    fn from(pr: PullRequestPayload) -> Self {
        PullRequest {
            number: PullRequestNumber(pr.number),
            author: GithubUser::new(&pr.user.login),
            assignees: pr.assignees.into_iter().map(|u| u.login).collect(),
            requested_reviewers: pr
                .requested_reviewers
                .into_iter()
                .map(|u| u.login)
                .collect(),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            state: match pr.state.as_str() {
                "closed" => PullRequestState::Closed,
                _ => PullRequestState::Open,
            },
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ReviewPayload {
    /// Reviews of deleted accounts have no user.
    pub user: Option<UserPayload>,
    pub state: String,
}

/// Base64 encoded file returned by the contents API.
#[derive(Deserialize, Debug)]
pub struct FileContentPayload {
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct PullRequestReviewEventPayload {
    pub action: String,
    pub review: ReviewPayload,
    pub pull_request: PullRequestRefPayload,
    pub repository: RepositoryPayload,
}

#[derive(Deserialize, Debug)]
pub struct PullRequestRefPayload {
    pub number: u64,
}

#[derive(Deserialize, Debug)]
pub struct IssueCommentEventPayload {
    pub action: String,
    pub issue: IssuePayload,
    pub comment: CommentPayload,
    pub repository: RepositoryPayload,
}

#[derive(Deserialize, Debug)]
pub struct IssuePayload {
    pub number: u64,
    pub user: UserPayload,
    /// Present only when the issue is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct CommentPayload {
    pub user: UserPayload,
    pub body: Option<String>,
}
