//! Encrypts and uploads GitHub Actions repository secrets.
//!
//! The upload is a three step pipeline: fetch the repository's public key,
//! seal the value to it locally, then create or update the secret with the
//! sealed value and the key id it was sealed under.

pub mod client;
pub mod config;
pub mod error;
pub mod report;
pub mod seal;
pub mod uploader;

pub use client::{GitHubClient, UpsertOutcome};
pub use config::{AuthToken, RepositoryId, SecretName, SecretRecord, UploaderConfig};
pub use error::{Error, Result};
pub use seal::{PublicKeyMaterial, SealedSecret, seal_record, seal_value};
pub use uploader::SecretUploader;
