use crate::bot::RepositoryClient;

/// Decides whether `username` is allowed to merge pull requests, which is the case for members
/// of the organization `org`.
///
/// A membership check that fails or times out is treated as "cannot merge", so that the PR is
/// handed over to a project owner instead.
pub async fn can_merge<Client: RepositoryClient>(
    client: &Client,
    org: &str,
    username: &str,
) -> bool {
    match client.is_org_member(org, username).await {
        Ok(true) => {
            tracing::debug!("{username} is a member of {org}");
            true
        }
        Ok(false) => {
            tracing::info!("{username} is not a member of {org}");
            false
        }
        Err(error) => {
            tracing::warn!("Cannot check membership of {username} in {org}: {error:?}");
            false
        }
    }
}
