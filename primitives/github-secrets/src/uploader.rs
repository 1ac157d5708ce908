use tracing::{debug, info, instrument};

use crate::client::{GitHubClient, UpsertOutcome};
use crate::config::{RepositoryId, SecretRecord, UploaderConfig};
use crate::error::Result;
use crate::seal::seal_record;

/// Fetches the repository key, seals the value and uploads it.
#[derive(Debug, Clone)]
pub struct SecretUploader {
    client: GitHubClient,
    repo: RepositoryId,
}

impl SecretUploader {
    pub fn new(client: GitHubClient, repo: RepositoryId) -> Self {
        Self { client, repo }
    }

    pub fn from_config(config: &UploaderConfig) -> Result<Self> {
        Ok(Self::new(GitHubClient::new(config)?, config.repo.clone()))
    }

    /// Runs the three steps in order. A failed key fetch returns before
    /// anything is sealed or written.
    #[instrument(skip_all, fields(repo = %self.repo, secret = %record.name))]
    pub async fn upload(&self, record: &SecretRecord) -> Result<UpsertOutcome> {
        let material = self
            .client
            .fetch_public_key(&self.repo)
            .await
            .inspect_err(|e| debug!(error = %e, "could not fetch public key"))?;
        info!(key_id = %material.key_id, "fetched public key");

        let sealed = seal_record(&material, record)?;

        let outcome = self
            .client
            .upsert_secret(&self.repo, &record.name, &sealed)
            .await
            .inspect_err(|e| debug!(error = %e, "upload rejected"))?;
        info!(outcome = outcome.as_str(), "secret stored");

        Ok(outcome)
    }
}
