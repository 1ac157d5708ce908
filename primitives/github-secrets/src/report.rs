//! Operator-facing console output.
//!
//! Nothing written here may contain the token or the secret value.

use std::io::{self, Write};

use reqwest::StatusCode;

use crate::client::UpsertOutcome;
use crate::config::{RepositoryId, SecretName};
use crate::error::Error;

pub fn announce(out: &mut impl Write, repo: &RepositoryId) -> io::Result<()> {
    writeln!(out, "🔐 Adding secret to {repo}...")?;
    writeln!(out)
}

pub fn success(out: &mut impl Write, name: &SecretName, outcome: UpsertOutcome) -> io::Result<()> {
    writeln!(out, "✅ Secret '{name}' added successfully! ({})", outcome.as_str())
}

/// Lists secrets the operator said still need to be entered by hand.
pub fn pending_reminder(
    out: &mut impl Write,
    names: &[String],
    settings_url: &str,
) -> io::Result<()> {
    if names.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "⚠️  Note: You still need to add these secrets manually:")?;
    for name in names {
        writeln!(out, "   - {name}")?;
    }
    writeln!(out)?;
    writeln!(out, "   Go to: {settings_url}")
}

pub fn failure(out: &mut impl Write, name: &SecretName, error: &Error) -> io::Result<()> {
    writeln!(out, "❌ Failed to add secret '{name}': {error}")?;
    if let Some(hint) = hint_for(error) {
        writeln!(out, "   hint: {hint}")?;
    }
    Ok(())
}

/// Steps for adding the secret without this tool.
pub fn manual_instructions(
    out: &mut impl Write,
    repo: &RepositoryId,
    name: &SecretName,
    settings_url: &str,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "⚠️  Could not add secret automatically. Please add it manually:")?;
    writeln!(out, "   1. Go to: {settings_url}")?;
    writeln!(out, "   2. Click \"New repository secret\"")?;
    writeln!(out, "   3. Name it {name} and paste the value")?;
    writeln!(out)?;
    writeln!(out, "   Or with the GitHub CLI:")?;
    writeln!(out, "   gh secret set {name} --repo {repo}")
}

pub fn hint_for(error: &Error) -> Option<&'static str> {
    match error {
        Error::Auth { .. } => {
            Some("check that the token is valid and can manage secrets on this repository")
        }
        Error::NotFound { .. } => {
            Some("check the repository spelling and that the token can access it")
        }
        Error::Transport(_) => Some("check network access to the GitHub API"),
        Error::Upload { .. } if error.status() == Some(StatusCode::UNPROCESSABLE_ENTITY) => {
            Some("GitHub rejected the payload; the key may have rotated, try again")
        }
        Error::Encoding(_) | Error::InvalidResponse(_) => {
            Some("the public key returned by GitHub could not be used")
        }
        _ => None,
    }
}
