//! Client for a single hosted model.
//!
//! [`HostedModel`] exposes the model's routes (`/`, `/info`, `/query`) plus two
//! helpers built on the root route for checking whether the model is awake.
//! Every call goes through [`send_with_retry`] and then through the same
//! response classification, so all operations fail the same way.

mod classify;
mod endpoint;
mod wait;

pub use endpoint::{RECOGNIZED_DOMAIN, is_valid_v1_url};
pub use wait::{DEFAULT_POLL_INTERVAL, WaitOptions, WaitOutcome};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::clock::{Sleeper, TokioSleeper};
use crate::config::{HostedModelConfig, mask_token};
use crate::error::{HostedModelError, Result};
use crate::http::{ReqwestTransport, Request, RetryPolicy, Transport, send_with_retry};

/// Value of the root route's `status` field once the model is awake.
const RUNNING_STATUS: &str = "running";

/// A remotely hosted model.
///
/// Cloning is cheap and clones share the same transport. All state is
/// read-only after construction, so concurrent calls are fine.
///
/// ```no_run
/// # async fn run() -> hosted_models::Result<()> {
/// use hosted_models::{HostedModel, HostedModelConfig};
/// use serde_json::json;
///
/// let model = HostedModel::new(
///     HostedModelConfig::new("https://my-model.hosted-models.runwayml.cloud/v1")
///         .with_token("my-secret-token"),
/// )?;
/// let output = model.query(json!({"prompt": "The one ring to"})).await?;
/// println!("{}", output["generated_text"]);
/// # Ok(())
/// # }
/// ```
pub struct HostedModel<T = ReqwestTransport, S = TokioSleeper> {
    url: String,
    headers: HeaderMap,
    retry_policy: RetryPolicy,
    transport: Arc<T>,
    sleeper: Arc<S>,
}

impl<T, S> Clone for HostedModel<T, S> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            headers: self.headers.clone(),
            retry_policy: self.retry_policy.clone(),
            transport: Arc::clone(&self.transport),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<T, S> fmt::Debug for HostedModel<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedModel")
            .field("url", &self.url)
            .field("authenticated", &self.headers.contains_key(AUTHORIZATION))
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl HostedModel {
    /// Creates a client using reqwest and the tokio timer.
    ///
    /// Fails with [`HostedModelError::InvalidUrl`] if the URL is not a
    /// versioned hosted model URL. Unless disabled in the config, a request to
    /// the root route is fired in the background to start waking the model.
    pub fn new(config: HostedModelConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.request_timeout())?;
        Self::with_transport(config, transport, TokioSleeper)
    }
}

impl<T, S> HostedModel<T, S>
where
    T: Transport + 'static,
    S: Sleeper + 'static,
{
    /// Creates a client on top of a custom transport and sleeper.
    #[tracing::instrument(skip(transport, sleeper))]
    pub fn with_transport(config: HostedModelConfig, transport: T, sleeper: S) -> Result<Self> {
        if !is_valid_v1_url(&config.url) {
            return Err(HostedModelError::InvalidUrl);
        }

        let model = Self {
            url: config.url.trim_end_matches('/').to_string(),
            headers: build_headers(config.token())?,
            retry_policy: RetryPolicy::default().with_max_attempts(config.max_attempts),
            transport: Arc::new(transport),
            sleeper: Arc::new(sleeper),
        };

        if config.wake_on_construct {
            model.spawn_wake_probe();
        }

        Ok(model)
    }

    /// Base URL without a trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Raw status document from the root route.
    #[tracing::instrument(skip(self))]
    pub async fn root(&self) -> Result<Value> {
        self.request(Method::GET, "/", None).await
    }

    /// Describes the inputs the model expects and the outputs it produces.
    /// The shape is whatever the model defines.
    #[tracing::instrument(skip(self))]
    pub async fn info(&self) -> Result<Value> {
        self.request(Method::GET, "/info", None).await
    }

    /// Runs the model on `input`, which must be a JSON object.
    ///
    /// Use [`info`](Self::info) to find out which fields a model expects.
    #[tracing::instrument(skip(self, input))]
    pub async fn query(&self, input: Value) -> Result<Value> {
        if !input.is_object() {
            return Err(HostedModelError::InvalidArgument("input".into()));
        }
        self.request(Method::POST, "/query", Some(input)).await
    }

    /// Typed variant of [`query`](Self::query). `input` must serialize to a
    /// JSON object; an output that does not fit `O` is reported as
    /// [`HostedModelError::Unexpected`].
    pub async fn query_as<I, O>(&self, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input)
            .map_err(|_| HostedModelError::InvalidArgument("input".into()))?;
        let output = self.query(input).await?;
        serde_json::from_value(output).map_err(|e| {
            warn!("Model output does not match the requested type: {}", e);
            HostedModelError::Unexpected
        })
    }

    /// True once the root route reports `"status": "running"`.
    #[tracing::instrument(skip(self))]
    pub async fn is_awake(&self) -> Result<bool> {
        let root = self.root().await?;
        Ok(root.get("status").and_then(Value::as_str) == Some(RUNNING_STATUS))
    }

    /// Polls [`is_awake`](Self::is_awake) every `poll_interval` until the model
    /// is running.
    ///
    /// Never needed for correctness, since `info` and `query` eventually
    /// answer anyway, but handy for holding back work until the model responds
    /// quickly. Any error stops the wait. Polls forever; see
    /// [`wait_until_awake_with`](Self::wait_until_awake_with) for a bounded or
    /// cancellable wait.
    pub async fn wait_until_awake(&self, poll_interval: Duration) -> Result<()> {
        self.wait_until_awake_with(WaitOptions::new(poll_interval), &CancellationToken::new())
            .await
            .map(|_| ())
    }

    /// Polls until the model is awake, `cancel` fires, or `max_polls` checks
    /// have found it asleep.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn wait_until_awake_with(
        &self,
        options: WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let mut polls: usize = 0;
        loop {
            if cancel.is_cancelled() {
                return Ok(WaitOutcome::Cancelled);
            }

            polls += 1;
            let awake = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
                awake = self.is_awake() => awake?,
            };

            if awake {
                info!("{} is awake after {} check(s)", self.url, polls);
                return Ok(WaitOutcome::Awake);
            }

            if let Some(max) = options.max_polls {
                if polls >= max.get() {
                    info!("{} still asleep after {} checks", self.url, polls);
                    return Ok(WaitOutcome::GaveUp);
                }
            }

            debug!(
                "{} not awake yet, checking again in {:?}",
                self.url, options.poll_interval
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
                _ = self.sleeper.sleep(options.poll_interval) => {}
            }
        }
    }

    async fn request(&self, method: Method, route: &str, body: Option<Value>) -> Result<Value> {
        let request = Request {
            method,
            url: endpoint::join(&self.url, route),
            headers: self.headers.clone(),
            body,
        };

        let response = send_with_retry(self.transport.as_ref(), &self.retry_policy, &request)
            .await
            .map_err(|e| {
                warn!("{} {} failed: {}", request.method, request.url, e);
                HostedModelError::from(e)
            })?;

        classify::classify(response)
    }

    /// Starts waking the model without waiting for it. The outcome is dropped.
    fn spawn_wake_probe(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let model = self.clone();
                handle.spawn(async move {
                    if let Err(e) = model.root().await {
                        debug!("Wake-up request to {} failed: {}", model.url, e);
                    }
                });
            }
            Err(_) => debug!("No tokio runtime available, skipping wake-up request"),
        }
    }
}

fn build_headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| HostedModelError::InvalidArgument("token".into()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using token for authentication: {}", mask_token(token));
    }

    Ok(headers)
}
