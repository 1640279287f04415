mod cli;
mod commands;
mod context;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::print_completions;
use cli::{Cli, Commands};
use context::AppContext;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

use adlift_core::auth::AuthError;
use adlift_core::credentials::{Credentials, CredentialsError};
use adlift_core::http::RequestError;
use adlift_core::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up AMAZON_* credentials from a local .env during development
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Completion(cmd) = &cli.command {
        let mut cli_cmd = Cli::command();
        print_completions(cmd.shell, &mut cli_cmd);
        return Ok(());
    }

    let settings = Settings::new().context("Failed to load configuration")?;
    let credentials = load_credentials()?;
    let app_context = AppContext::new(settings, credentials);

    info!("Running command {:?} ...", &cli.command);

    let result = match &cli.command {
        Commands::Verify(cmd) => commands::verify::verify_connection(&app_context, cmd).await,
        Commands::CampaignList(cmd) => commands::campaigns::list_campaigns(&app_context, cmd).await,
        Commands::AdGroupList(cmd) => commands::ad_groups::list_ad_groups(&app_context, cmd).await,
        Commands::KeywordList(cmd) => commands::keywords::list_keywords(&app_context, cmd).await,
        Commands::NegativeKeywordList(cmd) => {
            commands::keywords::list_negative_keywords(&app_context, cmd).await
        }
        Commands::ReportFetch(cmd) => commands::reports::fetch_report(&app_context, cmd).await,
        Commands::Completion(_) => unreachable!("handled above"),
    };

    if let Err(err) = &result {
        print_remediation(err);
    }

    // Persist any audit entries gathered during this run
    if let Err(err) = app_context.audit().save() {
        error!("Failed to save the audit trail: {}", err);
    }

    result
}

/// Load the credential bundle, preferring an explicit JSON file over the
/// environment. A missing bundle is a fatal configuration error before any
/// network activity happens.
fn load_credentials() -> anyhow::Result<Credentials> {
    if let Ok(path) = std::env::var("ADLIFT_CREDENTIALS_FILE") {
        let bundle = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credentials bundle {path}"))?;
        return Credentials::from_json_bundle(&bundle)
            .with_context(|| format!("Invalid credentials bundle {path}"));
    }
    Credentials::from_env().context("Failed to load credentials from the environment")
}

/// Fatal errors should tell the operator what to do next, not just print a
/// bare error chain.
fn print_remediation(err: &anyhow::Error) {
    for cause in err.chain() {
        if cause.downcast_ref::<CredentialsError>().is_some() {
            eprintln!("Troubleshooting:");
            eprintln!("1. Set AMAZON_CLIENT_ID, AMAZON_CLIENT_SECRET, AMAZON_REFRESH_TOKEN and AMAZON_PROFILE_ID");
            eprintln!("2. Or point ADLIFT_CREDENTIALS_FILE at a JSON bundle with those four fields");
            return;
        }
        if cause.downcast_ref::<AuthError>().is_some() {
            eprintln!("Troubleshooting:");
            eprintln!("1. Verify the client id/secret pair in the Amazon developer console");
            eprintln!("2. Refresh tokens expire when unused - re-run the authorization grant");
            return;
        }
        if let Some(request_err) = cause.downcast_ref::<RequestError>() {
            if request_err.is_auth_error() {
                eprintln!("Troubleshooting:");
                eprintln!("1. Verify the credentials belong to the configured profile id");
                eprintln!("2. Check that the advertising account has API access enabled");
            } else if request_err.status_code() == Some(429) {
                eprintln!("Troubleshooting:");
                eprintln!("1. The API quota is exhausted - lower rate_limit.max_per_second");
                eprintln!("2. Re-run later; quota windows reset within minutes");
            }
            return;
        }
    }
}
