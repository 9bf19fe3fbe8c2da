//! Client for models hosted behind a versioned HTTP API.
//!
//! ```no_run
//! # async fn run() -> hosted_models::Result<()> {
//! use hosted_models::{HostedModel, HostedModelConfig};
//! use std::time::Duration;
//!
//! let model = HostedModel::new(HostedModelConfig::new(
//!     "https://my-model.hosted-models.runwayml.cloud/v1",
//! ))?;
//! model.wait_until_awake(Duration::from_secs(1)).await?;
//! let info = model.info().await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod model;

pub use config::HostedModelConfig;
pub use error::{HostedModelError, Result};
pub use model::{HostedModel, WaitOptions, WaitOutcome};
pub use tokio_util::sync::CancellationToken;
