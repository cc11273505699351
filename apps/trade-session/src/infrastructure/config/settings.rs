//! Session Configuration Settings
//!
//! Configuration for a trade session, loaded from environment variables
//! with a fallback to token files written by the terminal's login flow.
//!
//! # Token Lookup Order
//!
//! 1. `FINAM_API_TOKEN` in the process environment (after `.env` loading)
//! 2. `~/.finam-cli/.env`
//! 3. `./.env`

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::services::{RefreshPolicy, SessionSettings};

/// Environment variable holding the long-lived API secret.
pub const TOKEN_ENV_VAR: &str = "FINAM_API_TOKEN";

/// Gateway endpoint used when `FINAM_GRPC_ADDR` is unset.
pub const DEFAULT_GRPC_ADDR: &str = "https://api.finam.ru:443";

/// Directory under the user's home holding the saved token.
const TOKEN_DIR: &str = ".finam-cli";

/// Token file name inside [`TOKEN_DIR`] and the working directory.
const TOKEN_FILE: &str = ".env";

/// Long-lived API secret exchanged for session tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Wrap a secret value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Raw secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiSecret([REDACTED])")
    }
}

/// Gateway connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Gateway endpoint URI.
    pub grpc_addr: String,
    /// Deadline for establishing the channel.
    pub connect_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            grpc_addr: DEFAULT_GRPC_ADDR.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// API secret.
    pub api_secret: ApiSecret,
    /// Where the secret was found.
    pub secret_source: SecretSource,
    /// Gateway connection settings.
    pub gateway: GatewaySettings,
    /// Per-call and renewal timing.
    pub session: SessionSettings,
    /// Prometheus listener port (0 = disabled).
    pub metrics_port: u16,
}

/// Origin of the API secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Process environment.
    Environment,
    /// A token file.
    File(PathBuf),
}

impl SessionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no API token can be found or the gateway
    /// address is not a valid URI.
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = dirs::home_dir();
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            home.as_deref(),
            Path::new(TOKEN_FILE),
        )
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// `home` and `local_env` are the fallbacks searched for the token.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        home: Option<&Path>,
        local_env: &Path,
    ) -> Result<Self, ConfigError> {
        let (api_secret, secret_source) = match lookup(TOKEN_ENV_VAR).filter(|t| !t.is_empty()) {
            Some(token) => (token, SecretSource::Environment),
            None => find_token(home, local_env)
                .map(|(token, path)| (token, SecretSource::File(path)))
                .ok_or(ConfigError::MissingToken)?,
        };

        let grpc_addr = normalize_endpoint(
            &lookup("FINAM_GRPC_ADDR")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_GRPC_ADDR.to_string()),
        )?;

        let defaults = SessionSettings::default();
        let gateway = GatewaySettings {
            grpc_addr,
            connect_timeout: parse_duration_secs(
                &lookup,
                "TRADE_SESSION_CONNECT_TIMEOUT_SECS",
                GatewaySettings::default().connect_timeout,
            ),
        };

        let session = SessionSettings {
            call_timeout: parse_duration_secs(
                &lookup,
                "TRADE_SESSION_CALL_TIMEOUT_SECS",
                defaults.call_timeout,
            ),
            auth_timeout: parse_duration_secs(
                &lookup,
                "TRADE_SESSION_AUTH_TIMEOUT_SECS",
                defaults.auth_timeout,
            ),
            refresh: RefreshPolicy::default(),
        };

        let metrics_port = lookup("TRADE_SESSION_METRICS_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            api_secret: ApiSecret::new(api_secret),
            secret_source,
            gateway,
            session,
            metrics_port,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No API token in the environment or any token file.
    #[error("{TOKEN_ENV_VAR} not set and no token file found")]
    MissingToken,

    /// Token to save is empty.
    #[error("API token cannot be empty")]
    EmptyToken,

    /// Gateway address is not a valid URI.
    #[error("invalid gateway address {addr}: {reason}")]
    InvalidEndpoint {
        /// The rejected address.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Home directory could not be determined.
    #[error("home directory not found")]
    NoHomeDir,

    /// Reading or writing a token file failed.
    #[error("token file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Search the token files for a non-empty `FINAM_API_TOKEN`.
///
/// Returns the token and the file it came from.
#[must_use]
pub fn find_token(home: Option<&Path>, local_env: &Path) -> Option<(String, PathBuf)> {
    let home_env = home.map(|h| h.join(TOKEN_DIR).join(TOKEN_FILE));

    home_env
        .into_iter()
        .chain(std::iter::once(local_env.to_path_buf()))
        .find_map(|path| read_token(&path).map(|token| (token, path)))
}

fn read_token(path: &Path) -> Option<String> {
    dotenvy::from_path_iter(path)
        .ok()?
        .filter_map(Result::ok)
        .find(|(key, value)| key == TOKEN_ENV_VAR && !value.is_empty())
        .map(|(_, value)| value)
}

/// Save the API token to `<home>/.finam-cli/.env`.
///
/// The file is replaced and, on Unix, readable by the owner only.
///
/// # Errors
///
/// Returns an error if the token is empty or the file cannot be written.
pub fn save_api_token(home: &Path, token: &str) -> Result<PathBuf, ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::EmptyToken);
    }

    let dir = home.join(TOKEN_DIR);
    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(TOKEN_FILE);
    let io_err = |source| ConfigError::Io {
        path: path.clone(),
        source,
    };

    std::fs::write(&path, format!("{TOKEN_ENV_VAR}={token}\n")).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    Ok(path)
}

/// Save the API token under the current user's home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] or any error from [`save_api_token`].
pub fn save_api_token_to_user_home(token: &str) -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    save_api_token(&home, token)
}

/// Add an `https://` scheme to bare `host:port` addresses and validate.
fn normalize_endpoint(addr: &str) -> Result<String, ConfigError> {
    let addr = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("https://{addr}")
    };

    let uri = addr
        .parse::<tonic::transport::Uri>()
        .map_err(|e| ConfigError::InvalidEndpoint {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

    if uri.host().is_none() {
        return Err(ConfigError::InvalidEndpoint {
            addr,
            reason: "missing host".to_string(),
        });
    }

    Ok(addr)
}

fn parse_duration_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    lookup(key)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn missing_local() -> PathBuf {
        PathBuf::from("/nonexistent/trade-session/.env")
    }

    #[test]
    fn token_from_environment_with_defaults() {
        let config =
            SessionConfig::from_lookup(lookup_from(&[("FINAM_API_TOKEN", "secret")]), None, &missing_local())
                .unwrap();

        assert_eq!(config.api_secret.expose(), "secret");
        assert_eq!(config.secret_source, SecretSource::Environment);
        assert_eq!(config.gateway.grpc_addr, DEFAULT_GRPC_ADDR);
        assert_eq!(config.gateway.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.session.call_timeout, Duration::from_secs(30));
        assert_eq!(config.session.auth_timeout, Duration::from_secs(10));
        assert_eq!(config.metrics_port, 0);
    }

    #[test]
    fn overrides_are_applied() {
        let config = SessionConfig::from_lookup(
            lookup_from(&[
                ("FINAM_API_TOKEN", "secret"),
                ("FINAM_GRPC_ADDR", "api.example.test:8443"),
                ("TRADE_SESSION_CALL_TIMEOUT_SECS", "5"),
                ("TRADE_SESSION_AUTH_TIMEOUT_SECS", "not-a-number"),
                ("TRADE_SESSION_METRICS_PORT", "9100"),
            ]),
            None,
            &missing_local(),
        )
        .unwrap();

        assert_eq!(config.gateway.grpc_addr, "https://api.example.test:8443");
        assert_eq!(config.session.call_timeout, Duration::from_secs(5));
        assert_eq!(config.session.auth_timeout, Duration::from_secs(10));
        assert_eq!(config.metrics_port, 9100);
    }

    #[test]
    fn missing_token_is_an_error() {
        let result = SessionConfig::from_lookup(lookup_from(&[]), None, &missing_local());
        assert!(matches!(result, Err(ConfigError::MissingToken)));
    }

    #[test]
    fn empty_env_token_falls_back_to_home_file() {
        let home = tempfile::tempdir().unwrap();
        let saved = save_api_token(home.path(), "from-home").unwrap();

        let config = SessionConfig::from_lookup(
            lookup_from(&[("FINAM_API_TOKEN", "")]),
            Some(home.path()),
            &missing_local(),
        )
        .unwrap();

        assert_eq!(config.api_secret.expose(), "from-home");
        assert_eq!(config.secret_source, SecretSource::File(saved));
    }

    #[test]
    fn home_file_takes_precedence_over_local() {
        let home = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let local_env = local.path().join(".env");
        std::fs::write(&local_env, "FINAM_API_TOKEN=from-local\n").unwrap();

        assert_eq!(
            find_token(Some(home.path()), &local_env),
            Some(("from-local".to_string(), local_env.clone()))
        );

        save_api_token(home.path(), "from-home").unwrap();
        let (token, _) = find_token(Some(home.path()), &local_env).unwrap();
        assert_eq!(token, "from-home");
    }

    #[test]
    fn file_without_token_is_skipped() {
        let local = tempfile::tempdir().unwrap();
        let local_env = local.path().join(".env");
        std::fs::write(&local_env, "OTHER=value\nFINAM_API_TOKEN=\n").unwrap();

        assert_eq!(find_token(None, &local_env), None);
    }

    #[test]
    fn save_overwrites_and_creates_directory() {
        let home = tempfile::tempdir().unwrap();
        save_api_token(home.path(), "first").unwrap();
        let path = save_api_token(home.path(), "second").unwrap();

        assert_eq!(path, home.path().join(".finam-cli").join(".env"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "FINAM_API_TOKEN=second\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn saved_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempfile::tempdir().unwrap();
        let path = save_api_token(home.path(), "secret").unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn empty_token_is_not_saved() {
        let home = tempfile::tempdir().unwrap();
        assert!(matches!(
            save_api_token(home.path(), ""),
            Err(ConfigError::EmptyToken)
        ));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = SessionConfig::from_lookup(
            lookup_from(&[("FINAM_API_TOKEN", "secret"), ("FINAM_GRPC_ADDR", "https://bad host")]),
            None,
            &missing_local(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let config =
            SessionConfig::from_lookup(lookup_from(&[("FINAM_API_TOKEN", "secret456")]), None, &missing_local())
                .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
