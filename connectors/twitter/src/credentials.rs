//! Session cookie credentials.
//!
//! The server authenticates with the `ct0` and `auth_token` cookies of a
//! logged-in browser session. They are looked up on every tool call so that
//! refreshed cookies take effect without a restart.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{TwitterError, TwitterResult};

/// Variable holding the `ct0` (CSRF) cookie.
pub const CT0_VAR: &str = "TWITTER_CT0";

/// Variable holding the `auth_token` session cookie.
pub const AUTH_TOKEN_VAR: &str = "TWITTER_AUTH_TOKEN";

/// A pair of session cookies.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    ct0: String,
    auth_token: String,
}

impl Credentials {
    /// Create credentials from raw cookie values.
    #[must_use]
    pub fn new(ct0: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            ct0: ct0.into(),
            auth_token: auth_token.into(),
        }
    }

    /// The `ct0` cookie, also sent as the CSRF header.
    #[must_use]
    pub fn ct0(&self) -> &str {
        &self.ct0
    }

    /// The `auth_token` cookie.
    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Value for the `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("ct0={}; auth_token={}", self.ct0, self.auth_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ct0", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Source of session credentials, queried once per tool call.
pub trait CredentialProvider: Send + Sync {
    /// Return the current credentials.
    fn load(&self) -> TwitterResult<Credentials>;
}

/// Fixed credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentials {
    fn load(&self) -> TwitterResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials from the process environment and a `.env` file.
///
/// A non-empty process variable wins. Otherwise the value comes from the
/// file, which is parsed again whenever its modification time changes.
pub struct EnvFileCredentials {
    path: PathBuf,
    env: Option<EnvLookup>,
    cache: Mutex<FileCache>,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Default)]
struct FileCache {
    modified: Option<SystemTime>,
    values: HashMap<String, String>,
}

impl Drop for FileCache {
    fn drop(&mut self) {
        for value in self.values.values_mut() {
            value.zeroize();
        }
    }
}

impl EnvFileCredentials {
    /// Read from `path` with the process environment taking precedence.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: Some(Box::new(|key: &str| std::env::var(key).ok())),
            cache: Mutex::new(FileCache::default()),
        }
    }

    /// Ignore the process environment and read only the file.
    #[must_use]
    pub fn file_only(mut self) -> Self {
        self.env = None;
        self
    }

    /// Take overriding values from `lookup` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Some(Box::new(lookup));
        self
    }

    /// Path of the `.env` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_value(&self, key: &str) -> Option<String> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok();

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if modified.is_none() {
            cache.values.clear();
            cache.modified = None;
            return None;
        }

        if cache.modified != modified {
            debug!(path = %self.path.display(), "Reloading credentials file");
            cache.values = read_env_file(&self.path);
            cache.modified = modified;
        }

        cache.values.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(env) = &self.env
            && let Some(value) = env(key)
            && !value.trim().is_empty()
        {
            return Some(value);
        }
        self.file_value(key)
    }
}

impl fmt::Debug for EnvFileCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvFileCredentials")
            .field("path", &self.path)
            .field("process_env", &self.env.is_some())
            .finish_non_exhaustive()
    }
}

impl CredentialProvider for EnvFileCredentials {
    fn load(&self) -> TwitterResult<Credentials> {
        match (self.lookup(CT0_VAR), self.lookup(AUTH_TOKEN_VAR)) {
            (Some(ct0), Some(auth_token)) => Ok(Credentials::new(ct0.trim(), auth_token.trim())),
            _ => Err(TwitterError::MissingCredentials {
                path: self.path.clone(),
            }),
        }
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read credentials file");
            return HashMap::new();
        }
    };

    let mut values = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed line in credentials file");
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, FileTimes};
    use std::time::Duration;

    fn write_env(path: &Path, contents: &str, mtime: SystemTime) {
        std::fs::write(path, contents).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_times(FileTimes::new().set_modified(mtime))
            .unwrap();
    }

    #[test]
    fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=ct0_test_value\nTWITTER_AUTH_TOKEN=\"auth_test_value\"\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path).file_only();
        let creds = provider.load().unwrap();
        assert_eq!(creds.ct0(), "ct0_test_value");
        assert_eq!(creds.auth_token(), "auth_test_value");
        assert_eq!(
            creds.cookie_header(),
            "ct0=ct0_test_value; auth_token=auth_test_value"
        );
    }

    #[test]
    fn test_reloads_when_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=old\nTWITTER_AUTH_TOKEN=old_token\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path).file_only();
        assert_eq!(provider.load().unwrap().ct0(), "old");

        write_env(
            &path,
            "TWITTER_CT0=new\nTWITTER_AUTH_TOKEN=new_token\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(2_000),
        );
        let creds = provider.load().unwrap();
        assert_eq!(creds.ct0(), "new");
        assert_eq!(creds.auth_token(), "new_token");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=file_ct0\nTWITTER_AUTH_TOKEN=file_token\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path)
            .with_env_lookup(|key| (key == CT0_VAR).then(|| "env_ct0".to_string()));
        let creds = provider.load().unwrap();
        assert_eq!(creds.ct0(), "env_ct0");
        assert_eq!(creds.auth_token(), "file_token");
    }

    #[test]
    fn test_blank_environment_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=file_ct0\nTWITTER_AUTH_TOKEN=file_token\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path).with_env_lookup(|key| match key {
            CT0_VAR => Some(String::new()),
            AUTH_TOKEN_VAR => Some("   ".to_string()),
            _ => None,
        });
        let creds = provider.load().unwrap();
        assert_eq!(creds.ct0(), "file_ct0");
        assert_eq!(creds.auth_token(), "file_token");
    }

    #[test]
    fn test_environment_alone_is_enough() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EnvFileCredentials::new(dir.path().join("absent.env"))
            .with_env_lookup(|key| Some(format!("{key}_value")));
        let creds = provider.load().unwrap();
        assert_eq!(creds.ct0(), "TWITTER_CT0_value");
        assert_eq!(creds.auth_token(), "TWITTER_AUTH_TOKEN_value");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EnvFileCredentials::new(dir.path().join("absent.env")).file_only();
        let err = provider.load().unwrap_err();
        assert!(matches!(err, TwitterError::MissingCredentials { .. }));
    }

    #[test]
    fn test_empty_values_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=\nTWITTER_AUTH_TOKEN=token\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path).file_only();
        let msg = provider.load().unwrap_err().to_string().to_lowercase();
        assert!(msg.contains("missing"));
        assert!(msg.contains("twitter_ct0"));
        assert!(msg.contains("twitter_auth_token"));
    }

    #[test]
    fn test_file_removed_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write_env(
            &path,
            "TWITTER_CT0=a\nTWITTER_AUTH_TOKEN=b\n",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let provider = EnvFileCredentials::new(&path).file_only();
        assert!(provider.load().is_ok());

        std::fs::remove_file(&path).unwrap();
        assert!(provider.load().is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let creds = Credentials::new("secret_ct0", "secret_token");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_static_credentials() {
        let provider = StaticCredentials::new(Credentials::new("a", "b"));
        assert_eq!(provider.load().unwrap(), Credentials::new("a", "b"));
    }
}
