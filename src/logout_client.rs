use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderName, InvalidHeaderName};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Logout request error type
///
/// The `Display` output is the short status text surfaced to the user: `timeout` for an
/// expired request, `error` for everything else, whether the server answered or not.
#[derive(thiserror::Error, Debug)]
pub enum LogoutError {
    #[error("timeout")]
    Timeout(#[source] reqwest::Error),
    #[error("error")]
    Rejected(StatusCode),
    #[error("error")]
    Connection(#[source] reqwest::Error),
    #[error("error")]
    Unexpected(#[source] reqwest::Error),
}

impl LogoutError {
    /// Status of the response, if the server sent one
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LogoutError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else if e.is_connect() {
            Self::Connection(e)
        } else {
            Self::Unexpected(e)
        }
    }
}

/// Logout client build error type
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("Invalid logout endpoint")]
    Endpoint(#[from] url::ParseError),
    #[error("Invalid anti-forgery header name")]
    Header(#[from] InvalidHeaderName),
    #[error("Failed to build the HTTP client")]
    Client(#[from] reqwest::Error),
}

/// HTTP client for the server logout endpoint
#[derive(Debug, Clone)]
pub struct LogoutClient {
    http_client: Client,
    endpoint: Url,
    csrf_header: HeaderName,
}

impl LogoutClient {
    /// Build a client posting to `endpoint` (resolved against `base_url`)
    ///
    /// With a `cookie_jar`, its cookies travel with the request the way a browser sends them.
    pub fn new(
        base_url: &Url,
        endpoint: &str,
        csrf_header: &str,
        timeout: Duration,
        cookie_jar: Option<Arc<Jar>>,
    ) -> Result<Self, BuildError> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(jar) = cookie_jar {
            builder = builder.cookie_provider(jar);
        }

        Ok(Self {
            http_client: builder.build()?,
            endpoint: base_url.join(endpoint)?,
            csrf_header: HeaderName::from_bytes(csrf_header.as_bytes())?,
        })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST to the logout endpoint with the anti-forgery token, and no body
    ///
    /// A missing token is sent as an empty header value. Any non-2xx status is an error.
    #[tracing::instrument(
        name = "Send logout request",
        skip(self, csrf_token),
        fields(endpoint = %self.endpoint, status = tracing::field::Empty)
    )]
    pub async fn logout(&self, csrf_token: Option<&SecretString>) -> Result<(), LogoutError> {
        let token = csrf_token.map_or("", |t| t.expose_secret());
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(self.csrf_header.clone(), token)
            .send()
            .await?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        if status.is_success() {
            Ok(())
        } else {
            Err(LogoutError::Rejected(status))
        }
    }
}
