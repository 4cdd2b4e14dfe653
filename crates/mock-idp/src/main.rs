//! Mock identity provider - Entry Point

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mock_idp::{config::Config, oauth::pkce::PkcePolicy, server::IdpServer};

#[derive(Parser, Debug)]
#[command(name = "mock-idp")]
#[command(about = "Mock OAuth 2.0 / OpenID Connect identity provider for tests")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Issuer placed in the `iss` claim of ID tokens
    #[arg(long, env = "MOCK_IDP_ISSUER")]
    issuer: Option<String>,

    /// Base URL announced in the discovery document
    #[arg(long, env = "MOCK_IDP_PUBLIC_URL")]
    public_url: Option<String>,

    /// Which PKCE challenge methods are honoured (allow-plain, s256-only)
    #[arg(
        long,
        value_parser = PkcePolicy::from_str,
        default_value = "allow-plain",
        env = "MOCK_IDP_PKCE_POLICY"
    )]
    pkce_policy: PkcePolicy,

    /// JSON file with user profiles keyed by subject
    #[arg(long, env = "MOCK_IDP_PROFILES")]
    profiles: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting mock identity provider");

    // Flags win over the environment
    let mut config = Config::from_env()?;
    config.pkce_policy = cli.pkce_policy;
    if cli.profiles.is_some() {
        config.profiles_path = cli.profiles;
    }
    if let Some(issuer) = cli.issuer {
        config.issuer = issuer;
    }
    if let Some(public_url) = cli.public_url {
        config.public_url = public_url.trim_end_matches('/').to_string();
    }

    let server = IdpServer::new(config)?;
    server.run_http(cli.port).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_policy_flag_accepts_config_spellings() {
        for (raw, expected) in [
            ("s256-only", PkcePolicy::S256Only),
            ("s256_only", PkcePolicy::S256Only),
            ("S256-Only", PkcePolicy::S256Only),
            ("allow_plain", PkcePolicy::AllowPlain),
        ] {
            let cli = Cli::try_parse_from(["mock-idp", "--pkce-policy", raw]).unwrap();
            assert_eq!(cli.pkce_policy, expected, "{raw}");
            assert_eq!(PkcePolicy::from_str(raw).unwrap(), expected);
        }
    }

    #[test]
    fn test_pkce_policy_flag_rejects_unknown() {
        assert!(Cli::try_parse_from(["mock-idp", "--pkce-policy", "strict"]).is_err());
    }
}
