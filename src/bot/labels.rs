//! Extraction of review-relevant metadata from labels and comment text.
use itertools::Itertools;

use crate::config::LabelConfig;

/// Role that a label plays in the review workflow.
#[derive(Debug, PartialEq, Eq)]
pub enum LabelKind {
    /// All reviewers approved the PR.
    Lgtm,
    /// Changelog category together with the project owner responsible for the merge.
    /// The owner is `None` when the label has no `@owner` suffix.
    Changelog { owner: Option<String> },
    Other,
}

impl LabelKind {
    pub fn classify(label: &str, config: &LabelConfig) -> Self {
        if label == config.lgtm {
            return LabelKind::Lgtm;
        }
        if starts_with_ignore_case(label, &config.changelog_prefix) {
            return LabelKind::Changelog {
                owner: parse_owner(label),
            };
        }
        LabelKind::Other
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|start| start.eq_ignore_ascii_case(prefix))
}

/// `PR CHANGELOG: Server Errors -- @kevintab95` => `kevintab95`
fn parse_owner(label: &str) -> Option<String> {
    let (_, owner) = label.rsplit_once('@')?;
    let owner = owner.trim();
    (!owner.is_empty()).then(|| owner.to_string())
}

/// Finds the project owner named by the first changelog label of a PR.
pub fn extract_changelog_owner<S: AsRef<str>>(
    labels: &[S],
    config: &LabelConfig,
) -> Option<String> {
    labels
        .iter()
        .find_map(|label| match LabelKind::classify(label.as_ref(), config) {
            LabelKind::Changelog { owner } => Some(owner),
            _ => None,
        })
        .flatten()
}

pub fn is_lgtm_label(label: &str, config: &LabelConfig) -> bool {
    LabelKind::classify(label, config) == LabelKind::Lgtm
}

pub fn has_lgtm_label<S: AsRef<str>>(labels: &[S], config: &LabelConfig) -> bool {
    labels
        .iter()
        .any(|label| is_lgtm_label(label.as_ref(), config))
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Returns the users mentioned (`@username`) in `text`, in order of their first appearance.
///
/// Mentions must not be glued to a preceding word, so e-mail addresses are skipped.
pub fn extract_mentioned_users(text: &str) -> Vec<String> {
    let mut users = Vec::new();
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        let glued = previous.is_some_and(|p| p.is_ascii_alphanumeric());
        previous = Some(c);
        if c != '@' || glued {
            continue;
        }

        let start = index + 1;
        let mut end = start;
        while let Some(&(next_index, next)) = chars.peek() {
            if !is_username_char(next) {
                break;
            }
            end = next_index + next.len_utf8();
            previous = Some(next);
            chars.next();
        }

        let username = text[start..end].trim_end_matches('-');
        if !username.is_empty() && !username.starts_with('-') {
            users.push(username.to_string());
        }
    }
    users.into_iter().unique().collect()
}

/// Does the comment ask for another look at the PR (`PTAL` or `please take a look`)?
pub fn is_review_request(text: &str) -> bool {
    let lowercase = text.to_lowercase();
    if lowercase.contains("please take a look") {
        return true;
    }
    lowercase
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "ptal")
}
