use std::borrow::Cow;

use itertools::Itertools;

/// Pluralizes a piece of text.
pub fn pluralize(base: &str, count: usize) -> Cow<'_, str> {
    if count == 1 {
        base.into()
    } else {
        format!("{base}s").into()
    }
}

/// Formats usernames as a comma separated list of mentions (`@a, @b`).
pub fn mention_list<S: AsRef<str>>(users: &[S]) -> String {
    users
        .iter()
        .map(|user| format!("@{}", user.as_ref()))
        .join(", ")
}
