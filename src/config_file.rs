use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf};

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Profile {
    /// Port the proxy listens on
    pub port: Option<u16>,

    /// Product API base url
    pub api_base_url: Option<String>,

    pub api_version: Option<String>,

    pub ordering_api_version: Option<String>,

    /// OAuth 2.0 token exchange url
    pub token_url: Option<String>,

    /// OAuth 2.0 Client Identifier <https://www.rfc-editor.org/rfc/rfc6749#section-2.2>
    pub client_id: Option<String>,

    /// OAuth 2.0 Client Secret <https://www.rfc-editor.org/rfc/rfc6749#section-2.3.1>
    pub client_secret: Option<String>,

    /// OAuth 2.0 Refresh Token <https://www.rfc-editor.org/rfc/rfc6749#section-1.5>
    pub refresh_token: Option<String>,

    pub access_token: Option<String>,

    pub user_email: Option<String>,

    /// Seconds subtracted from a token's lifetime
    pub token_refresh_margin: Option<u64>,

    pub token_timeout: Option<u64>,

    pub api_timeout: Option<u64>,

    /// Browser origins allowed by CORS
    pub cors_origins: Option<Vec<String>>,
}

impl Profile {
    /// Environment variables this profile provides, in the names the
    /// command line reads them from.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let strings = [
            ("AMAZON_BUSINESS_API_BASE_URL", &self.api_base_url),
            ("API_VERSION", &self.api_version),
            ("ORDERING_API_VERSION", &self.ordering_api_version),
            ("AMAZON_TOKEN_URL", &self.token_url),
            ("AMAZON_CLIENT_ID", &self.client_id),
            ("AMAZON_CLIENT_SECRET", &self.client_secret),
            ("AMAZON_REFRESH_TOKEN", &self.refresh_token),
            ("X_AMZ_ACCESS_TOKEN", &self.access_token),
            ("X_AMZ_USER_EMAIL", &self.user_email),
        ];
        let numbers = [
            ("TOKEN_REFRESH_MARGIN_SECS", self.token_refresh_margin),
            ("TOKEN_TIMEOUT_SECS", self.token_timeout),
            ("API_TIMEOUT_SECS", self.api_timeout),
        ];

        let mut vars = Vec::new();

        if let Some(port) = self.port {
            vars.push(("PORT", port.to_string()));
        }
        for (name, value) in strings {
            if let Some(value) = value {
                vars.push((name, value.clone()));
            }
        }
        for (name, value) in numbers {
            if let Some(value) = value {
                vars.push((name, value.to_string()));
            }
        }
        if let Some(origins) = &self.cors_origins {
            vars.push(("CORS_ORIGINS", origins.join(",")));
        }

        vars
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub profile: HashMap<String, Profile>,
}

pub struct ConfigFile {
    file_path: PathBuf,
}

impl ConfigFile {
    pub fn new() -> Result<ConfigFile> {
        let mut file_path = home::home_dir().context("Couldn't access the home directory")?;
        file_path.push(".marketplace-proxy/config.toml");

        Ok(ConfigFile { file_path })
    }

    pub fn with_path(file_path: PathBuf) -> ConfigFile {
        ConfigFile { file_path }
    }

    pub fn read(&self) -> Config {
        log::debug!("Reading the config file {}", self.file_path.to_string_lossy());
        let text = fs::read_to_string(&self.file_path).unwrap_or_default();

        toml::from_str::<Config>(&text).unwrap_or_else(|e| {
            log::warn!(
                "Cannot parse config file {}. Error: {:?}",
                &self.file_path.to_string_lossy(),
                anyhow!(e)
            );

            Config::default()
        })
    }

    pub fn profile(&self, name: &str) -> Result<Profile> {
        self.read()
            .profile
            .remove(name)
            .with_context(|| format!("The given profile `{}` doesn't exist", name))
    }

    /// Exports the profile's settings as environment variables. Variables
    /// already present in the environment are left untouched.
    ///
    /// Must run before any other thread is started.
    pub fn apply_profile(&self, name: &str) -> Result<()> {
        let profile = self.profile(name)?;

        for (key, value) in profile.env_vars() {
            if env::var_os(key).is_some() {
                log::debug!("{} already set, ignoring profile `{}` value", key, name);
                continue;
            }

            // SAFETY: called during start-up while the process is single-threaded.
            unsafe { env::set_var(key, value) };
        }

        Ok(())
    }
}
