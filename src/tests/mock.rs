use octocrab::Octocrab;
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use crate::github::api::client::GithubRepositoryClient;
use crate::tests::state::default_repo_name;

/// Stands in for the GitHub REST API.
pub struct GitHubMockServer {
    mock_server: MockServer,
}

impl GitHubMockServer {
    pub async fn start() -> Self {
        Self {
            mock_server: MockServer::start().await,
        }
    }

    pub fn server(&self) -> &MockServer {
        &self.mock_server
    }

    /// Client of the default repository that talks to this server.
    pub fn client(&self) -> GithubRepositoryClient {
        let client = Octocrab::builder()
            .base_uri(self.mock_server.uri())
            .unwrap()
            .build()
            .unwrap();
        GithubRepositoryClient::new(client, default_repo_name())
    }
}

/// Error body in the shape that GitHub sends with failed requests.
pub fn github_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    }))
}

pub fn pr_payload(number: u64, author: &str) -> serde_json::Value {
    json!({
        "number": number,
        "user": { "login": author },
        "state": "open",
        "assignees": [],
        "requested_reviewers": [],
        "labels": []
    })
}

pub fn review_payload(reviewer: Option<&str>, state: &str) -> serde_json::Value {
    json!({
        "user": reviewer.map(|login| json!({ "login": login })),
        "state": state
    })
}
