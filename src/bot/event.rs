use crate::github::{GithubRepoName, GithubUser, PullRequestNumber, ReviewVerdict};

#[derive(Debug)]
pub enum BotEvent {
    /// A review was submitted on a pull request.
    ReviewSubmitted(PullRequestReview),
    /// A comment was posted on an issue or a pull request.
    Comment(IssueComment),
    /// The configuration of some repository has been changed for the bot's Github App.
    InstallationsChanged,
    /// Periodic event that serves for re-checking the assignment of open pull requests.
    Refresh,
}

#[derive(Debug)]
pub struct PullRequestReview {
    pub repository: GithubRepoName,
    pub pr_number: PullRequestNumber,
    pub reviewer: GithubUser,
    pub verdict: ReviewVerdict,
}

#[derive(Debug)]
pub struct IssueComment {
    pub repository: GithubRepoName,
    /// `None` when the comment was posted on an issue that is not a pull request.
    pub pr_number: Option<PullRequestNumber>,
    pub author: GithubUser,
    pub issue_author: GithubUser,
    pub text: String,
}
