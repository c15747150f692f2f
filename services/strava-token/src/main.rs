//! strava-token: obtain, refresh and revoke Strava access tokens
//!
//! Usage:
//!   strava-token [--config PATH] authorize-url REDIRECT_URI [SCOPE,...]
//!   strava-token [--config PATH] exchange CODE
//!   strava-token [--config PATH] refresh REFRESH_TOKEN
//!   strava-token [--config PATH] deauthorize ACCESS_TOKEN
//!
//! Token responses are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result, bail};
use common::{Secret, StravaConfig};
use strava_api::StravaClient;
use strava_auth::{ApprovalPrompt, AuthorisationScope, ClientCredentials, TokenGrant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scopes requested when none are given on the command line
const DEFAULT_SCOPES: &[AuthorisationScope] =
    &[AuthorisationScope::Read, AuthorisationScope::ActivityRead];

#[derive(Debug, PartialEq)]
enum Command {
    AuthorizeUrl {
        redirect_uri: String,
        scopes: Vec<AuthorisationScope>,
    },
    Exchange(String),
    Refresh(String),
    Deauthorize(String),
}

#[derive(Debug, PartialEq)]
struct Cli {
    config_path: Option<String>,
    command: Command,
}

fn parse_scope(s: &str) -> Result<AuthorisationScope> {
    const ALL: [AuthorisationScope; 7] = [
        AuthorisationScope::Read,
        AuthorisationScope::ReadAll,
        AuthorisationScope::ProfileReadAll,
        AuthorisationScope::ProfileWrite,
        AuthorisationScope::ActivityRead,
        AuthorisationScope::ActivityReadAll,
        AuthorisationScope::ActivityWrite,
    ];
    ALL.into_iter()
        .find(|scope| scope.as_str() == s)
        .with_context(|| format!("unknown scope: {s}"))
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config_path = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter.next().context("--config requires a path")?;
            config_path = Some(value.clone());
        } else {
            rest.push(arg.as_str());
        }
    }

    let command = match rest.as_slice() {
        ["authorize-url", redirect_uri] => Command::AuthorizeUrl {
            redirect_uri: (*redirect_uri).to_owned(),
            scopes: DEFAULT_SCOPES.to_vec(),
        },
        ["authorize-url", redirect_uri, scopes] => Command::AuthorizeUrl {
            redirect_uri: (*redirect_uri).to_owned(),
            scopes: scopes
                .split(',')
                .map(parse_scope)
                .collect::<Result<Vec<_>>>()?,
        },
        ["exchange", code] => Command::Exchange((*code).to_owned()),
        ["refresh", token] => Command::Refresh((*token).to_owned()),
        ["deauthorize", token] => Command::Deauthorize((*token).to_owned()),
        _ => bail!(
            "usage: strava-token [--config PATH] <authorize-url REDIRECT_URI [SCOPES] | exchange CODE | refresh TOKEN | deauthorize TOKEN>"
        ),
    };

    Ok(Cli {
        config_path,
        command,
    })
}

/// Log a typed API failure with its category before handing it to anyhow.
fn report(err: strava_api::Error) -> anyhow::Error {
    error!(
        kind = %err.kind(),
        status = err.status(),
        envelope = %err.envelope(),
        retryable = err.is_retryable(),
        "strava call failed"
    );
    err.into()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let path = StravaConfig::resolve_path(cli.config_path.as_deref());
    let config = StravaConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    info!(config = %path.display(), base_url = %config.api.base_url, "configuration loaded");

    let client = StravaClient::from_config(&config)?;

    match cli.command {
        Command::AuthorizeUrl {
            redirect_uri,
            scopes,
        } => {
            let client_id = config
                .client
                .client_id
                .context("client.client_id is not set")?;
            let url = strava_auth::authorization_url(
                &client,
                client_id,
                &redirect_uri,
                ApprovalPrompt::Auto,
                &scopes,
                None,
            )?;
            println!("{url}");
            return Ok(());
        }
        Command::Exchange(code) => {
            let credentials = ClientCredentials::from_config(&config.client)?;
            let token = strava_auth::exchange_token(
                &client,
                &credentials,
                TokenGrant::AuthorizationCode(code),
            )
            .await
            .map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Command::Refresh(refresh) => {
            let credentials = ClientCredentials::from_config(&config.client)?;
            let token = strava_auth::exchange_token(
                &client,
                &credentials,
                TokenGrant::RefreshToken(refresh),
            )
            .await
            .map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Command::Deauthorize(access_token) => {
            strava_auth::deauthorise(&client, &Secret::new(access_token))
                .await
                .map_err(report)?;
        }
    }

    let quota = client.quota();
    info!(
        short_term_usage = quota.short_term_usage,
        short_term_limit = quota.short_term_limit,
        daily_usage = quota.daily_usage,
        daily_limit = quota.daily_limit,
        short_term_percent = quota.short_term_percent,
        daily_percent = quota.daily_percent,
        "rate limit after call"
    );

    Ok(())
}
