use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::time::Duration;

use crate::api_client::{DEFAULT_API_BASE_URL, DEFAULT_API_VERSION, DEFAULT_ORDERING_API_VERSION};
use crate::config_file::ConfigFile;
use crate::oauth_client::DEFAULT_TOKEN_URL;
use crate::routes::DEFAULT_CORS_ORIGINS;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Arguments {
    /// Port the proxy listens on
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Product API base url
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "AMAZON_BUSINESS_API_BASE_URL")]
    pub api_base_url: String,

    /// Product search API version
    #[arg(long, default_value = DEFAULT_API_VERSION, env = "API_VERSION")]
    pub api_version: String,

    /// Ordering API version
    #[arg(long, default_value = DEFAULT_ORDERING_API_VERSION, env = "ORDERING_API_VERSION")]
    pub ordering_api_version: String,

    /// OAuth 2.0 token exchange url
    #[arg(long, default_value = DEFAULT_TOKEN_URL, env = "AMAZON_TOKEN_URL")]
    pub token_url: String,

    /// OAuth 2.0 Client Identifier https://www.rfc-editor.org/rfc/rfc6749#section-2.2
    #[arg(long, env = "AMAZON_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth 2.0 Client Secret https://www.rfc-editor.org/rfc/rfc6749#section-2.3.1
    #[arg(long, env = "AMAZON_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth 2.0 Refresh Token https://www.rfc-editor.org/rfc/rfc6749#section-1.5
    #[arg(long, env = "AMAZON_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Caller access token used when the request carries none
    #[arg(long, env = "X_AMZ_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Caller e-mail used when the request carries none
    #[arg(long, env = "X_AMZ_USER_EMAIL")]
    pub user_email: Option<String>,

    /// Seconds before expiry at which a token is refreshed
    #[arg(long, default_value_t = 60, env = "TOKEN_REFRESH_MARGIN_SECS")]
    pub token_refresh_margin: u64,

    /// Token endpoint timeout in seconds
    #[arg(long, default_value_t = 10, env = "TOKEN_TIMEOUT_SECS")]
    pub token_timeout: u64,

    /// Product API timeout in seconds
    #[arg(long, default_value_t = 30, env = "API_TIMEOUT_SECS")]
    pub api_timeout: u64,

    /// Allowed CORS origin, repeatable
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CORS_ORIGINS.map(String::from)
    )]
    pub cors_origins: Vec<String>,

    /// Profile from the config file
    #[arg(long, env = "MARKETPLACE_PROXY_PROFILE")]
    pub profile: Option<String>,

    /// Config file, defaults to ~/.marketplace-proxy/config.toml
    #[arg(long, env = "MARKETPLACE_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Arguments {
    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }
}

pub struct Args;

impl Args {
    /// Reads `.env`, applies the selected config profile and parses the
    /// command line. Must run before the async runtime starts.
    pub fn parse() -> Result<Arguments> {
        if dotenv().is_ok() {
            log::debug!("Loaded .env file");
        }

        let args = Arguments::parse();

        let Some(profile) = &args.profile else {
            return Ok(args);
        };

        let config_file = match &args.config {
            Some(path) => ConfigFile::with_path(path.clone()),
            None => ConfigFile::new()?,
        };
        config_file.apply_profile(profile)?;

        log::debug!("Applied profile `{}`", profile);

        // Profile values are now in the environment.
        Ok(Arguments::parse())
    }
}
