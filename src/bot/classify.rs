use std::collections::HashMap;

use crate::bot::RepositoryClient;
use crate::github::{PullRequest, Review, ReviewVerdict};

/// Are there requested reviewers that have not submitted a review yet?
pub fn has_pending_reviews(pr: &PullRequest) -> bool {
    !pr.requested_reviewers.is_empty()
}

/// The most recent verdict of every reviewer that approved or requested changes.
///
/// `Commented` reviews neither grant nor revoke an approval, so they are ignored.
#[derive(Debug, Default)]
pub struct ReviewHistory {
    latest: HashMap<String, ReviewVerdict>,
}

impl ReviewHistory {
    /// `reviews` must be ordered from the oldest to the newest.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut latest = HashMap::new();
        for review in reviews {
            if review.verdict == ReviewVerdict::Commented {
                continue;
            }
            latest.insert(review.reviewer.to_lowercase(), review.verdict);
        }
        Self { latest }
    }

    /// Is there a reviewer whose latest verdict still requests changes?
    pub fn has_outstanding_changes_requested(&self) -> bool {
        self.latest
            .values()
            .any(|verdict| *verdict == ReviewVerdict::ChangesRequested)
    }

    /// Did every reviewer approve in their latest review?
    /// A PR without any reviews is not approved.
    pub fn has_been_approved_by_all(&self) -> bool {
        !self.latest.is_empty()
            && self
                .latest
                .values()
                .all(|verdict| *verdict == ReviewVerdict::Approved)
    }
}

/// Mutually exclusive review state of a PR, in order of priority.
#[derive(Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    PendingReviews,
    ChangesRequested,
    ApprovedByAll,
    /// None of the above holds, which is usually a transient read.
    Undetermined,
}

impl ReviewStatus {
    pub fn classify(pr: &PullRequest, history: &ReviewHistory) -> Self {
        if has_pending_reviews(pr) {
            ReviewStatus::PendingReviews
        } else if history.has_outstanding_changes_requested() {
            ReviewStatus::ChangesRequested
        } else if history.has_been_approved_by_all() {
            ReviewStatus::ApprovedByAll
        } else {
            ReviewStatus::Undetermined
        }
    }
}

/// Classifies a freshly fetched PR.
/// The review history is only downloaded when there are no pending reviews.
pub async fn determine_review_status<Client: RepositoryClient>(
    client: &Client,
    pr: &PullRequest,
) -> anyhow::Result<ReviewStatus> {
    if has_pending_reviews(pr) {
        return Ok(ReviewStatus::PendingReviews);
    }
    let reviews = client.get_reviews(pr.number).await?;
    Ok(ReviewStatus::classify(pr, &ReviewHistory::from_reviews(&reviews)))
}
