//! HTTP client for the SonarQube web API.
//!
//! [`ApiClient`] bundles the shared `reqwest` client, the server base URL
//! and the configured credentials. Every request derives a fresh URL from
//! the immutable base, with all query values percent-encoded, so concurrent
//! lifecycle operations can share one client safely.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ProviderError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Credentials attached to every outbound request.
#[derive(Clone)]
enum Auth {
    Anonymous,
    /// User token, sent as HTTP Basic with the token as login and an empty
    /// password (SonarQube convention).
    Token(String),
    Basic {
        user: String,
        password: Option<String>,
    },
}

/// Shared HTTP client plus base URL and authentication for one server.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Auth,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, without credentials.
    ///
    /// The base URL may carry a context path (`https://host/sonar`); request
    /// paths are appended below it.
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(base_url)?;
        // join() resolves relative to the last path segment, so the base
        // must end with a slash for context paths to survive.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url,
            auth: Auth::Anonymous,
        })
    }

    /// Authenticate with a user token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Auth::Token(token.into());
        self
    }

    /// Authenticate with a login and optional password.
    pub fn with_basic_auth(
        mut self,
        user: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        self.auth = Auth::Basic {
            user: user.into(),
            password: password.map(Into::into),
        };
        self
    }

    /// The server base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Derive a request URL from the base: `path` appended, `query` pairs
    /// percent-encoded. The base itself is never mutated.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Issue a GET request against an API path.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ProviderError> {
        let url = self.endpoint(path, query)?;
        debug!(%url, "GET");
        Ok(self.authenticate(self.http.get(url)).send().await?)
    }

    /// Issue a POST request against an API path. SonarQube's write
    /// endpoints take their parameters in the query string, so no body is
    /// sent.
    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ProviderError> {
        let url = self.endpoint(path, query)?;
        debug!(%url, "POST");
        Ok(self.authenticate(self.http.post(url)).send().await?)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Anonymous => request,
            Auth::Token(token) => request.basic_auth(token, Some("")),
            Auth::Basic { user, password } => request.basic_auth(user, password.as_deref()),
        }
    }
}

/// Check a response against the expected status.
///
/// On mismatch the body is read as text and returned as a
/// [`ProviderError::Remote`], verbatim.
pub async fn expect_status(
    response: Response,
    expected: StatusCode,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Remote { status, body });
    }
    Ok(response)
}

/// Read a response body and decode it as JSON.
///
/// A body that fails to decode surfaces as [`ProviderError::Decode`] even
/// though the status was acceptable.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_path() {
        let client = ApiClient::new("http://localhost:9000").unwrap();
        let url = client.endpoint("api/projects/create", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/projects/create");
    }

    #[test]
    fn test_endpoint_keeps_context_path() {
        let client = ApiClient::new("http://localhost:9000/sonar").unwrap();
        let url = client.endpoint("api/projects/search", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/sonar/api/projects/search"
        );
    }

    #[test]
    fn test_endpoint_encodes_query_values() {
        let client = ApiClient::new("http://localhost:9000").unwrap();
        let url = client
            .endpoint(
                "api/projects/create",
                &[("name", "my project"), ("project", "a&b%c")],
            )
            .unwrap();
        assert_eq!(url.query(), Some("name=my+project&project=a%26b%25c"));
    }

    #[test]
    fn test_endpoint_derives_fresh_urls() {
        let client = ApiClient::new("http://localhost:9000").unwrap();
        let first = client
            .endpoint("api/projects/create", &[("project", "one")])
            .unwrap();
        let second = client
            .endpoint("api/projects/delete", &[("projects", "two")])
            .unwrap();

        assert_ne!(first, second);
        // The shared base never picks up a path or query.
        assert_eq!(client.base_url().as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
