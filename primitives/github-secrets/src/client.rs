//! Minimal GitHub REST client for the Actions secrets endpoints.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::config::{AuthToken, RepositoryId, SecretName, UploaderConfig};
use crate::error::{Error, Result};
use crate::seal::{PublicKeyMaterial, SealedSecret};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("github-secrets/", env!("CARGO_PKG_VERSION"));

/// Result of a successful create-or-update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 201: the secret did not exist before.
    Created,
    /// 204: an existing secret was overwritten.
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        }
    }
}

/// Authenticated client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
}

fn default_headers(token: &AuthToken) -> std::result::Result<HeaderMap, InvalidHeaderValue> {
    let mut auth = HeaderValue::from_str(&token.header_value())?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
    Ok(headers)
}

async fn body_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

impl GitHubClient {
    /// Builds a client with the configured timeout and auth headers.
    pub fn new(config: &UploaderConfig) -> Result<Self> {
        let headers = default_headers(&config.token).map_err(|_| Error::InvalidToken)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    fn secrets_url(&self, repo: &RepositoryId) -> String {
        format!(
            "{}/repos/{}/{}/actions/secrets",
            self.api_url,
            repo.owner(),
            repo.name()
        )
    }

    /// Fetches the repository's current sealing key. One attempt, no retry.
    pub async fn fetch_public_key(&self, repo: &RepositoryId) -> Result<PublicKeyMaterial> {
        let url = format!("{}/public-key", self.secrets_url(repo));
        debug!(%repo, "fetching public key");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        debug!(%repo, %status, "public key response");

        match status {
            s if s.is_success() => {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth {
                status,
                body: body_text(response).await,
            }),
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                body: body_text(response).await,
            }),
            _ => Err(Error::Api {
                status,
                body: body_text(response).await,
            }),
        }
    }

    /// Creates or replaces a secret. Only 201 and 204 count as success.
    pub async fn upsert_secret(
        &self,
        repo: &RepositoryId,
        name: &SecretName,
        sealed: &SealedSecret,
    ) -> Result<UpsertOutcome> {
        let url = format!("{}/{}", self.secrets_url(repo), name);
        debug!(%repo, secret = %name, key_id = %sealed.key_id, "uploading secret");

        let response = self.http.put(&url).json(sealed).send().await?;
        let status = response.status();
        debug!(%repo, secret = %name, %status, "upload response");

        match status {
            StatusCode::CREATED => Ok(UpsertOutcome::Created),
            StatusCode::NO_CONTENT => Ok(UpsertOutcome::Updated),
            _ => Err(Error::Upload {
                status,
                body: body_text(response).await,
            }),
        }
    }
}
