//! Run rental-site form actions from the command line and print their
//! sanitized results as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use rentals::config::RegistrationSettings;
use rentals::domain::ports::AccountRegistration;
use rentals::domain::{
    CredentialAccountCoordinator, CredentialsSubmission, EmailAddress, Identity, IdentityId,
    NewIdentity, Username, normalize_issue_batch, sanitize_action_result, sanitize_json_str,
};
use rentals::outbound::{Argon2PasswordService, InMemoryIdentityStore};
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `rentals-actions` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rentals-actions",
    about = "Run rental-site form actions and print sanitized JSON results",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Clone, Subcommand)]
enum Action {
    /// Create a credentials account against an in-memory identity store.
    Register {
        /// Email address to register.
        #[arg(long, value_name = "email", default_value = "")]
        email: String,
        /// Plaintext password.
        #[arg(long, value_name = "password", default_value = "")]
        password: String,
        /// Preferred username; defaults to the email local part.
        #[arg(long, value_name = "name")]
        username: Option<String>,
        /// Seed a Google-only identity with this email before registering.
        #[arg(long = "existing-google", value_name = "email")]
        existing_google: Vec<String>,
    },
    /// Read an action result from stdin and print its sanitized form.
    Sanitize,
    /// Read a validation issue batch from stdin and print the error tree.
    Normalize,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let output = match args.action {
        Action::Register {
            email,
            password,
            username,
            existing_google,
        } => {
            let submission = CredentialsSubmission::new(&email, &password, username.as_deref());
            register(&submission, &existing_google).await?
        }
        Action::Sanitize => sanitize_json_str(&read_stdin()?).to_json(),
        Action::Normalize => {
            let batch: Value = serde_json::from_str(&read_stdin()?)
                .map_err(|error| io::Error::other(format!("parse issue batch: {error}")))?;
            normalize_issue_batch(&batch).to_json()
        }
    };

    println!("{output}");
    Ok(())
}

async fn register(
    submission: &CredentialsSubmission,
    existing_google: &[String],
) -> io::Result<Value> {
    let settings = RegistrationSettings::load_from_iter([OsString::from("rentals-actions")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let passwords = Argon2PasswordService::from_settings(&settings)
        .map_err(|error| io::Error::other(format!("build password service: {error}")))?;

    let seeded = existing_google
        .iter()
        .map(String::as_str)
        .map(google_identity)
        .collect::<io::Result<Vec<_>>>()?;
    let store = InMemoryIdentityStore::with_identities(seeded);

    let coordinator = CredentialAccountCoordinator::new(Arc::new(store), Arc::new(passwords));
    let result = coordinator.create_credentials_user(submission).await;
    Ok(sanitize_action_result(&result.to_json()).to_json())
}

fn google_identity(raw: &str) -> io::Result<Identity> {
    let email = EmailAddress::parse(raw)
        .map_err(|error| io::Error::other(format!("existing identity {raw}: {error}")))?;
    let username = Username::from_email(&email)
        .map_err(|error| io::Error::other(format!("existing identity {raw}: {error}")))?;
    Ok(Identity::from_new(
        IdentityId::random(),
        NewIdentity::third_party(&email, username, None),
    ))
}

fn read_stdin() -> io::Result<String> {
    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;
    Ok(raw)
}
