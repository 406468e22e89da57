use thiserror::Error;

use crate::github::PullRequestNumber;

#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// The PR is approved and its author cannot merge it, but no changelog label names
    /// somebody who could.
    #[error("PR #{pr} is ready to be merged, but it has no changelog label naming its owner")]
    MissingChangelogOwner { pr: PullRequestNumber },
}
