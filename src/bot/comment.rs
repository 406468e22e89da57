use crate::utils::text::mention_list;

/// A comment that can be posted to a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn render(&self) -> &str {
        &self.text
    }
}

pub fn review_done_comment(reviewer: &str) -> Comment {
    Comment::new(format!("Unassigning @{reviewer} since the review is done."))
}

pub fn changes_requested_comment(author: &str, reviewer: &str) -> Comment {
    Comment::new(format!(
        "Hi @{author}, it looks like some changes were requested on this pull request by @{reviewer}. PTAL. Thanks!"
    ))
}

pub fn lgtm_removed_comment(label: &str) -> Comment {
    Comment::new(format!(
        "Removing the `{label}` label since changes were requested on this pull request."
    ))
}

pub fn already_approved_comment(reviewer: &str) -> Comment {
    Comment::new(format!(
        "Unassigning @{reviewer} since they have already approved the PR."
    ))
}

/// A single comment for all newly assigned reviewers.
pub fn assign_reviewers_comment<S: AsRef<str>>(reviewers: &[S]) -> Comment {
    Comment::new(format!(
        "Assigning {} for code owner reviews, Thanks!",
        mention_list(reviewers)
    ))
}

pub fn ready_to_merge_author_comment(author: &str) -> Comment {
    Comment::new(format!(
        "Hi @{author}, this PR is ready to be merged. Please address any remaining comments prior to merging, and feel free to merge this PR once the CI checks pass and you're happy with it. Thanks!"
    ))
}

pub fn ready_to_merge_owner_comment(owner: &str) -> Comment {
    Comment::new(format!(
        "Hi @{owner}, this PR is ready to be merged. Author of this PR does not have permissions to merge this PR. After you confirm the last review, could you please help to merge this PR once the CI checks pass? Thanks!"
    ))
}

/// Used when nobody but the reviewers can merge the PR.
pub fn ready_to_merge_ask_reviewer_comment(author: &str) -> Comment {
    Comment::new(format!(
        "Hi @{author}, this PR is ready to be merged. Please ask one of the reviewers to help with the merge, also, make sure there are no pending comments before merge. Thanks!"
    ))
}

pub fn rereview_requested_comment(author: &str) -> Comment {
    Comment::new(format!(
        "Unassigning @{author} since a re-review was requested. @{author}, please make sure you have addressed all review comments. Thanks!"
    ))
}

pub fn changes_requested_reminder_comment(author: &str) -> Comment {
    Comment::new(format!(
        "Hi @{author}, changes were requested on this pull request, PTAL. Thanks!"
    ))
}

pub fn needs_assistance_comment(assignee: &str) -> Comment {
    Comment::new(format!(
        "Hi @{assignee}, this pull request needs some assistance, PTAL. Thanks!"
    ))
}
