//! GitHub Secrets - Actions Secret Uploader
//!
//! Fetches a repository's Actions public key, seals a secret value to it
//! locally and creates or updates the secret through the GitHub REST API.
//! The plaintext never leaves the machine.
//!
//! # Usage
//!
//! ```bash
//! # Token and repository from the environment, value as a flag
//! export GITHUB_SECRETS_TOKEN=ghp_...
//! github-secrets --repo org/repo --secret-name DEPLOY_KEY --secret-value "$DEPLOY_KEY"
//!
//! # Read the value from stdin to keep it out of shell history
//! pass show deploy-key | github-secrets --repo org/repo --secret-name DEPLOY_KEY --value-stdin
//!
//! # Remind the operator about secrets that still need manual entry
//! github-secrets -r org/repo -n API_TOKEN --value-stdin --remind SUPABASE_URL --remind SUPABASE_ANON_KEY
//!
//! # GitHub Enterprise
//! github-secrets --api-url https://ghe.example.com/api/v3 --web-url https://ghe.example.com ...
//! ```
//!
//! Exits 0 when the secret was created or updated, 1 otherwise.

use std::io::{self, Read};
use std::time::Duration;

use clap::Parser;
use github_secrets::config::{DEFAULT_API_URL, DEFAULT_WEB_URL};
use github_secrets::{
    AuthToken, Error, RepositoryId, SecretName, SecretRecord, SecretUploader, UploaderConfig,
    report,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Encrypts and uploads a GitHub Actions repository secret.
#[derive(Parser)]
#[command(name = "github-secrets", version)]
#[command(about = "Encrypts and uploads a GitHub Actions repository secret")]
struct Args {
    /// Target repository as owner/name.
    #[arg(short, long, env = "GITHUB_SECRETS_REPO")]
    repo: RepositoryId,

    /// GitHub token allowed to manage the repository's secrets.
    #[arg(short, long, env = "GITHUB_SECRETS_TOKEN", hide_env_values = true)]
    token: String,

    /// Name of the secret to create or update.
    #[arg(short = 'n', long, env = "GITHUB_SECRETS_NAME")]
    secret_name: SecretName,

    /// Secret value. Prefer --value-stdin or the environment variable.
    #[arg(
        long,
        env = "GITHUB_SECRETS_VALUE",
        hide_env_values = true,
        conflicts_with = "value_stdin"
    )]
    secret_value: Option<String>,

    /// Read the secret value from stdin.
    #[arg(long)]
    value_stdin: bool,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_SECRETS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// GitHub web URL used in remediation links.
    #[arg(long, env = "GITHUB_SECRETS_WEB_URL", default_value = DEFAULT_WEB_URL)]
    web_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "GITHUB_SECRETS_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// Other secrets that still have to be added by hand.
    #[arg(long = "remind", value_name = "NAME")]
    remind: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Builds the uploader config, moving the token out of the arguments.
    fn take_config(&mut self) -> UploaderConfig {
        let token = AuthToken::new(std::mem::take(&mut self.token));
        UploaderConfig::new(self.repo.clone(), token)
            .with_api_url(&self.api_url)
            .with_web_url(&self.web_url)
            .with_timeout(Duration::from_secs(self.timeout))
    }

    /// Takes the secret value out of the arguments, or reads it from stdin.
    fn take_record(&mut self) -> Result<SecretRecord, Error> {
        let value = if self.value_stdin {
            let mut value = String::new();
            io::stdin().read_to_string(&mut value)?;
            strip_newline(&mut value);
            value
        } else {
            self.secret_value.take().ok_or(Error::MissingValue)?
        };

        Ok(SecretRecord::new(self.secret_name.clone(), value))
    }
}

/// Drops one trailing newline, as left by `echo` or a heredoc.
fn strip_newline(value: &mut String) {
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("github_secrets=debug")
        } else {
            EnvFilter::new("github_secrets=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let mut args = Args::parse();
    init_tracing(args.verbose);

    let config = args.take_config();
    let settings_url = config.settings_url();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let record = match args.take_record() {
        Ok(record) => record,
        Err(e) => {
            let _ = report::failure(&mut stderr, &args.secret_name, &e);
            std::process::exit(1);
        }
    };

    let _ = report::announce(&mut stdout, &config.repo);

    let result = match SecretUploader::from_config(&config) {
        Ok(uploader) => uploader.upload(&record).await,
        Err(e) => Err(e),
    };
    drop(record);

    match result {
        Ok(outcome) => {
            let _ = report::success(&mut stdout, &args.secret_name, outcome);
            let _ = report::pending_reminder(&mut stdout, &args.remind, &settings_url);
        }
        Err(e) => {
            let _ = report::failure(&mut stderr, &args.secret_name, &e);
            let _ = report::manual_instructions(
                &mut stdout,
                &config.repo,
                &args.secret_name,
                &settings_url,
            );
            std::process::exit(1);
        }
    }
}
