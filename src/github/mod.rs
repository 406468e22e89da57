//! Contains definitions of common types (pull request, user, repository name, review) needed
//! for working with (GitHub) repositories.
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

pub mod api;
pub(crate) mod payload;
pub mod server;
mod webhook;

pub use api::GithubAppState;
pub use webhook::GitHubWebhook;

/// Unique identifier of a GitHub repository
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct GithubRepoName {
    owner: String,
    name: String,
}

impl GithubRepoName {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for GithubRepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.name))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GithubUser {
    pub username: String,
}

impl GithubUser {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    /// GitHub logins are case-insensitive.
    pub fn is(&self, username: &str) -> bool {
        self.username.eq_ignore_ascii_case(username)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PullRequestNumber(pub u64);

impl From<u64> for PullRequestNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PullRequestNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Closed,
}

/// Point-in-time snapshot of a pull request.
#[derive(Clone, Debug)]
pub struct PullRequest {
    pub number: PullRequestNumber,
    pub author: GithubUser,
    pub assignees: Vec<String>,
    /// Reviewers that were asked for a review and have not submitted one yet.
    pub requested_reviewers: Vec<String>,
    pub labels: Vec<String>,
    pub state: PullRequestState,
}

impl PullRequest {
    pub fn is_assigned(&self, username: &str) -> bool {
        self.assignees
            .iter()
            .any(|assignee| assignee.eq_ignore_ascii_case(username))
    }

    #[cfg(test)]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_closed(&self) -> bool {
        self.state == PullRequestState::Closed
    }
}

/// Verdict of a submitted review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    ChangesRequested,
    Commented,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown review state `{0}`")]
pub struct UnknownReviewState(String);

impl FromStr for ReviewVerdict {
    type Err = UnknownReviewState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "changes_requested" => Ok(Self::ChangesRequested),
            "commented" => Ok(Self::Commented),
            _ => Err(UnknownReviewState(s.to_string())),
        }
    }
}

/// A single review from the review history of a pull request.
#[derive(Clone, Debug)]
pub struct Review {
    pub reviewer: String,
    pub verdict: ReviewVerdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verdicts() {
        assert_eq!("APPROVED".parse(), Ok(ReviewVerdict::Approved));
        assert_eq!(
            "changes_requested".parse(),
            Ok(ReviewVerdict::ChangesRequested)
        );
        assert_eq!("Commented".parse(), Ok(ReviewVerdict::Commented));
        assert!("dismissed".parse::<ReviewVerdict>().is_err());
    }

    #[test]
    fn repo_name_is_lowercase() {
        let name = GithubRepoName::new("Oppia", "OppiaBot");
        assert_eq!(name.to_string(), "oppia/oppiabot");
    }

    #[test]
    fn assignee_check_ignores_case() {
        let pr = PullRequest {
            number: 1.into(),
            author: GithubUser::new("alice"),
            assignees: vec!["Bob".to_string()],
            requested_reviewers: vec![],
            labels: vec![],
            state: PullRequestState::Open,
        };
        assert!(pr.is_assigned("bob"));
        assert!(!pr.is_assigned("alice"));
    }
}
