use base64::Engine;
use http::StatusCode;

use crate::bot::RepositoryClient;
use crate::config::{parse_config, ConfigError, RepositoryConfig, CONFIG_FILE_PATH};
use crate::github::api::client::GithubRepositoryClient;
use crate::github::payload::FileContentPayload;

/// Checks if `username` is a member of the organization `org`.
///
/// GitHub answers `204` for members, `404` for non-members and `302` when the requester itself
/// is not allowed to see the membership, which we also treat as "not a member".
///
/// Documentation: https://docs.github.com/en/rest/orgs/members?apiVersion=2022-11-28#check-organization-membership-for-a-user
pub async fn check_org_membership(
    repo: &GithubRepositoryClient,
    org: &str,
    username: &str,
) -> anyhow::Result<bool> {
    let client = repo.client();
    let response = client
        ._get(format!("/orgs/{org}/members/{username}"))
        .await?;
    let status = response.status();

    tracing::trace!("Membership of `{username}` in `{org}`: {status}");
    match status {
        StatusCode::NO_CONTENT => Ok(true),
        StatusCode::NOT_FOUND | StatusCode::FOUND => Ok(false),
        _ => {
            let text = client.body_to_string(response).await.unwrap_or_default();
            Err(anyhow::anyhow!(
                "Unexpected response when checking membership of {username} in {org} ({status}): {text}"
            ))
        }
    }
}

/// Loads the repository configuration file from the default branch.
/// A missing file yields the default configuration.
///
/// Documentation: https://docs.github.com/en/rest/repos/contents?apiVersion=2022-11-28#get-repository-content
pub async fn load_repository_config(
    repo: &GithubRepositoryClient,
) -> anyhow::Result<RepositoryConfig> {
    let client = repo.client();
    let url = format!("/repos/{}/contents/{CONFIG_FILE_PATH}", repo.repository());
    let response = client._get(url).await?;
    let status = response.status();
    let text = client.body_to_string(response).await?;

    match status {
        StatusCode::OK => {
            let payload: FileContentPayload = serde_json::from_str(&text)?;
            Ok(decode_config(&payload.content)?)
        }
        StatusCode::NOT_FOUND => {
            tracing::debug!(
                "{CONFIG_FILE_PATH} not found in {}, using defaults",
                repo.repository()
            );
            Ok(RepositoryConfig::default())
        }
        _ => Err(anyhow::anyhow!(
            "Cannot load {CONFIG_FILE_PATH} from {} ({status}): {text}",
            repo.repository()
        )),
    }
}

/// The contents API wraps base64 output into multiple lines.
fn decode_config(content: &str) -> Result<RepositoryConfig, ConfigError> {
    let content: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(content)
        .map_err(|error| ConfigError::Encoding(error.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|error| ConfigError::Encoding(error.to_string()))?;
    parse_config(&text)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::decode_config;
    use crate::bot::RepositoryClient;
    use crate::config::{ConfigError, DEFAULT_SETTLE_DELAY};
    use crate::tests::mock::{github_error, GitHubMockServer};

    async fn membership(status: u16) -> anyhow::Result<bool> {
        let gh = GitHubMockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/oppia/members/frank"))
            .respond_with(ResponseTemplate::new(status))
            .mount(gh.server())
            .await;
        gh.client().is_org_member("oppia", "frank").await
    }

    #[tokio::test]
    async fn member_of_organization() {
        assert!(membership(204).await.unwrap());
    }

    #[tokio::test]
    async fn not_member_of_organization() {
        assert!(!membership(404).await.unwrap());
    }

    #[tokio::test]
    async fn hidden_membership() {
        assert!(!membership(302).await.unwrap());
    }

    #[tokio::test]
    async fn membership_server_error() {
        assert!(membership(500).await.is_err());
    }

    #[tokio::test]
    async fn load_config_from_repository() {
        let gh = GitHubMockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/oppia/oppia/contents/reviewbot.toml"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": "b3JnYW5pemF0aW9uID0g\nIm9wcGlhLWRldnMiCg==\n"
            })))
            .mount(gh.server())
            .await;

        let config = gh.client().load_config().await.unwrap();
        assert_eq!(config.organization.as_deref(), Some("oppia-devs"));
    }

    #[tokio::test]
    async fn missing_config_uses_defaults() {
        let gh = GitHubMockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/oppia/oppia/contents/reviewbot.toml"))
            .respond_with(github_error(404, "Not Found"))
            .mount(gh.server())
            .await;

        let config = gh.client().load_config().await.unwrap();
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert!(config.organization.is_none());
    }

    #[test]
    fn decode_wrapped_base64() {
        // "settle_delay_sec = 10\n" split across lines
        let config = decode_config("c2V0dGxlX2RlbGF5\nX3NlYyA9IDEwCg==\n").unwrap();
        assert_eq!(config.settle_delay, Duration::from_secs(10));
    }

    #[test]
    fn decode_invalid_base64() {
        assert!(matches!(
            decode_config("not base64!"),
            Err(ConfigError::Encoding(_))
        ));
    }
}
