use clap::builder::TypedValueParser as _;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::LevelFilter;
use solar_auth::settings::{AuthEndpoints, AuthSettings, HttpClientConfig, DEFAULT_APP_NAME};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file the PKCE verifier and generated client id are persisted to.
pub const DEFAULT_STORAGE_PATH: &str = ".solar_auth.json";

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Initialize the session and print the sign-in state
    Status,
    /// Start a login and print the identity provider URL to open
    Login,
    /// Finish a login with the URL the identity provider redirected back to
    Callback {
        /// Full redirect URL including the `code` query parameter
        #[arg(long)]
        url: String,
    },
    /// End the current session
    Logout,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Base URL of the application backend serving `/api/auth/token` and `/api/auth/logout`.
    #[arg(short, long, env, default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Host of the infranode serving token introspection. `https://` is assumed when no
    /// scheme is given.
    #[arg(long, env, default_value = "localhost:8443")]
    pub base_infranode_url: String,

    /// Identity provider page a login redirects to.
    #[arg(long, env, default_value = "http://localhost:8080/login")]
    pub login_redirect_url: String,

    /// Stable identifier of this client. Generated and persisted when not set.
    #[arg(long, env)]
    client_id: Option<String>,

    /// Application name shown by the identity provider when no title is available.
    #[arg(long, env, default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// URL the identity provider sends the browser back to after login.
    #[arg(long, env, default_value = "http://localhost:3000/")]
    pub redirect_uri: String,

    /// JSON file used as durable storage.
    #[arg(long, env, default_value = DEFAULT_STORAGE_PATH)]
    storage_path: PathBuf,

    /// Timeout in seconds for every auth and API request
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Retries for transient HTTP failures
    #[arg(long, env, default_value_t = 2)]
    pub http_max_retries: u32,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)),
        )]
    pub log_level_filter: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn set_client_id(mut self, client_id: String) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// The subcommand to run, `status` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }

    pub fn auth_endpoints(&self) -> AuthEndpoints {
        AuthEndpoints::from_bases(
            &self.base_url,
            &self.base_infranode_url,
            &self.login_redirect_url,
        )
    }

    /// Settings for the auth core using `client_id`, usually [`Self::client_id`] or a
    /// persisted generated one.
    pub fn auth_settings(&self, client_id: &str) -> AuthSettings {
        AuthSettings::new(self.auth_endpoints(), client_id)
            .with_fallback_app_name(self.app_name.clone())
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            max_retries: self.http_max_retries,
            ..HttpClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "BASE_URL",
        "BASE_INFRANODE_URL",
        "LOGIN_REDIRECT_URL",
        "CLIENT_ID",
        "APP_NAME",
        "REDIRECT_URI",
        "STORAGE_PATH",
        "HTTP_TIMEOUT_SECS",
        "HTTP_MAX_RETRIES",
        "LOG_LEVEL_FILTER",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["solar_auth_platform"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = parse(&[]);

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.client_id(), None);
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.storage_path(), Path::new(DEFAULT_STORAGE_PATH));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert_eq!(config.command(), Command::Status);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_defaults() {
        clear_env();
        env::set_var("BASE_URL", "https://solar.test");
        env::set_var("CLIENT_ID", "c1");
        env::set_var("HTTP_TIMEOUT_SECS", "5");
        env::set_var("LOG_LEVEL_FILTER", "DEBUG");

        let config = parse(&[]);
        clear_env();

        assert_eq!(config.base_url, "https://solar.test");
        assert_eq!(config.client_id(), Some("c1"));
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
    }

    #[test]
    #[serial]
    fn test_blank_client_id_counts_as_missing() {
        clear_env();
        let config = parse(&["--client-id", "  "]);
        assert_eq!(config.client_id(), None);
        assert_eq!(
            config.set_client_id("c2".to_string()).client_id(),
            Some("c2")
        );
    }

    #[test]
    #[serial]
    fn test_auth_settings_mapping() {
        clear_env();
        let config = parse(&[
            "--base-url",
            "https://solar.test",
            "--base-infranode-url",
            "infra.solar.test",
            "--login-redirect-url",
            "https://login.solar.test/authorize",
            "--app-name",
            "Doctors",
        ]);

        let settings = config.auth_settings("c1");

        assert_eq!(settings.client_id, "c1");
        assert_eq!(settings.fallback_app_name, "Doctors");
        assert_eq!(
            settings.endpoints.token_url,
            "https://solar.test/api/auth/token"
        );
        assert_eq!(
            settings.endpoints.introspect_url,
            "https://infra.solar.test/innerApp/oauth2/introspect"
        );
        assert_eq!(
            settings.endpoints.login_redirect_url,
            "https://login.solar.test/authorize"
        );
    }

    #[test]
    #[serial]
    fn test_http_client_config() {
        clear_env();
        let config = parse(&["--http-timeout-secs", "7", "--http-max-retries", "0"]);
        let http = config.http_client_config();
        assert_eq!(http.timeout, Duration::from_secs(7));
        assert_eq!(http.max_retries, 0);
    }

    #[test]
    #[serial]
    fn test_callback_subcommand() {
        clear_env();
        let config = parse(&["callback", "--url", "http://localhost:3000/?code=abc"]);
        assert_eq!(
            config.command(),
            Command::Callback {
                url: "http://localhost:3000/?code=abc".to_string()
            }
        );
    }
}
