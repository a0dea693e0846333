//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets never live in the TOML: the password comes from AUTH_PASSWORD or
//! `password_file`, and a previous session is resumed from
//! AUTH_ACCESS_TOKEN + AUTH_REFRESH_TOKEN.

use bearer_auth::{Credentials, HeaderInjection, USERS_PATH};
use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub headers: Vec<HeaderInjection>,
}

/// Remote API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Path fetched when `--path` is not given
    #[serde(default = "default_path")]
    pub path: String,
}

/// Login settings
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Path to a file containing the password (alternative to AUTH_PASSWORD env var)
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    /// Token pair resumed from the environment
    #[serde(skip)]
    pub session: Option<Credentials>,
}

fn default_timeout() -> u64 {
    30
}

fn default_path() -> String {
    USERS_PATH.to_string()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Password resolution order:
    /// 1. AUTH_PASSWORD env var
    /// 2. password_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if !config.api.path.starts_with('/') {
            return Err(common::Error::Config(format!(
                "path must start with /, got: {}",
                config.api.path
            )));
        }

        if let Ok(password) = std::env::var("AUTH_PASSWORD") {
            config.auth.password = Some(Secret::new(password));
        } else if let Some(ref password_file) = config.auth.password_file {
            let password = std::fs::read_to_string(password_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read password_file {}: {e}",
                    password_file.display()
                ))
            })?;
            let password = password.trim().to_owned();
            if !password.is_empty() {
                config.auth.password = Some(Secret::new(password));
            }
        }

        if config.auth.login.is_some() && config.auth.password.is_none() {
            return Err(common::Error::MissingCredential(
                "auth.login is set but neither AUTH_PASSWORD nor auth.password_file provides a password"
                    .into(),
            ));
        }

        config.auth.session = session_from_env()?;

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("auth-cli.toml")
    }
}

/// Both tokens, or neither.
fn session_from_env() -> common::Result<Option<Credentials>> {
    let access = std::env::var("AUTH_ACCESS_TOKEN").ok();
    let refresh = std::env::var("AUTH_REFRESH_TOKEN").ok();
    match (access, refresh) {
        (Some(access), Some(refresh)) => Ok(Some(Credentials::new(access, refresh))),
        (None, None) => Ok(None),
        _ => Err(common::Error::MissingCredential(
            "AUTH_ACCESS_TOKEN and AUTH_REFRESH_TOKEN must be set together".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_auth_env() {
        unsafe {
            remove_env("AUTH_PASSWORD");
            remove_env("AUTH_ACCESS_TOKEN");
            remove_env("AUTH_REFRESH_TOKEN");
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("auth-cli.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn valid_toml() -> &'static str {
        r#"
[api]
base_url = "https://api.example.com"

[auth]
login = "foo"

[[headers]]
name = "x-client"
value = "auth-cli"
"#
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        unsafe { set_env("AUTH_PASSWORD", "foo") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let config = Config::load(&path).unwrap();
        clear_auth_env();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.path, "/users");
        assert_eq!(config.auth.login.as_deref(), Some("foo"));
        assert_eq!(config.auth.password.as_ref().unwrap().expose(), "foo");
        assert!(config.auth.session.is_none());
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers[0].name, "x-client");
    }

    #[test]
    fn test_password_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        let dir = tempfile::tempdir().unwrap();
        let password_path = dir.path().join("password");
        std::fs::write(&password_path, "from-file\n").unwrap();
        let toml = format!(
            "[api]\nbase_url = \"http://localhost:8080\"\n\n[auth]\nlogin = \"foo\"\npassword_file = \"{}\"\n",
            password_path.display()
        );
        let path = write_config(&dir, &toml);

        let config = Config::load(&path).unwrap();

        assert_eq!(config.auth.password.as_ref().unwrap().expose(), "from-file");
    }

    #[test]
    fn test_env_password_takes_precedence_over_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        unsafe { set_env("AUTH_PASSWORD", "from-env") };
        let dir = tempfile::tempdir().unwrap();
        let password_path = dir.path().join("password");
        std::fs::write(&password_path, "from-file").unwrap();
        let toml = format!(
            "[api]\nbase_url = \"http://localhost:8080\"\n\n[auth]\nlogin = \"foo\"\npassword_file = \"{}\"\n",
            password_path.display()
        );
        let path = write_config(&dir, &toml);

        let config = Config::load(&path).unwrap();
        clear_auth_env();

        assert_eq!(config.auth.password.as_ref().unwrap().expose(), "from-env");
    }

    #[test]
    fn test_login_without_password_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::MissingCredential(_)), "got: {err:?}");
    }

    #[test]
    fn test_session_resumed_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        unsafe {
            set_env("AUTH_ACCESS_TOKEN", "TOKEN");
            set_env("AUTH_REFRESH_TOKEN", "REFRESH_TOKEN");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"https://api.example.com\"\n");

        let config = Config::load(&path).unwrap();
        clear_auth_env();

        let session = config.auth.session.unwrap();
        assert_eq!(session.access_token(), "TOKEN");
        assert_eq!(session.refresh_token(), "REFRESH_TOKEN");
        assert!(config.auth.login.is_none());
    }

    #[test]
    fn test_half_session_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_auth_env();
        unsafe { set_env("AUTH_ACCESS_TOKEN", "TOKEN") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"https://api.example.com\"\n");

        let result = Config::load(&path);
        clear_auth_env();

        assert!(matches!(result, Err(common::Error::MissingCredential(_))));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"ftp://example.com\"\n");

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("base_url"), "got: {err}");
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"https://api.example.com\"\ntimeout_secs = 0\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_rejects_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"https://api.example.com\"\npath = \"users\"\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("path must start with /"), "got: {err}");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/auth-cli.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");

        let result = Config::load(&path);
        assert!(matches!(result, Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/etc/auth-cli/env.toml") };
        assert_eq!(
            Config::resolve_path(Some("/tmp/cli.toml")),
            PathBuf::from("/tmp/cli.toml")
        );
        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("/etc/auth-cli/env.toml")
        );
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("auth-cli.toml"));
    }
}
