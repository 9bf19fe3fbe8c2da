//! Endpoint configuration for a [`HostedModel`](crate::HostedModel).

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HostedModelError, Result};

/// Environment variable holding the model URL.
pub const URL_ENV: &str = "HOSTED_MODEL_URL";

/// Environment variable holding the secret token of a private model.
pub const TOKEN_ENV: &str = "HOSTED_MODEL_TOKEN";

/// Everything needed to talk to one hosted model.
///
/// ```
/// use hosted_models::HostedModelConfig;
///
/// // Private model
/// let config = HostedModelConfig::new("https://my-model.hosted-models.runwayml.cloud/v1")
///     .with_token("my-secret-token");
/// assert_eq!(config.token(), Some("my-secret-token"));
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct HostedModelConfig {
    /// Full model URL, e.g. `https://my-model.hosted-models.runwayml.cloud/v1`.
    pub url: String,

    /// Secret token. Only private models need one.
    #[serde(default)]
    pub token: Option<String>,

    /// Fire a background request at construction so the model starts waking
    /// up before the first real call.
    #[serde(default = "default_wake_on_construct")]
    pub wake_on_construct: bool,

    /// Upper bound on transport calls per operation while the model keeps
    /// answering 502/429. Unbounded when absent.
    #[serde(default)]
    pub max_attempts: Option<NonZeroUsize>,

    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_wake_on_construct() -> bool {
    true
}

impl HostedModelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            wake_on_construct: default_wake_on_construct(),
            max_attempts: None,
            request_timeout_ms: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_wake_on_construct(mut self, wake: bool) -> Self {
        self.wake_on_construct = wake;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<NonZeroUsize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The token, treating an empty string as no token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Reads [`URL_ENV`] and [`TOKEN_ENV`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a caller-supplied lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_ENV)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| HostedModelError::InvalidArgument("url".into()))?;

        let mut config = Self::new(url.trim());
        if let Some(token) = lookup(TOKEN_ENV) {
            config = config.with_token(token);
        }
        Ok(config)
    }
}

impl fmt::Debug for HostedModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedModelConfig")
            .field("url", &self.url)
            .field("token", &self.token().map(mask_token))
            .field("wake_on_construct", &self.wake_on_construct)
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Keeps the first and last four characters of a token for logs.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
