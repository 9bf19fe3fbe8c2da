use anyhow::{Context, Result};
use clap::Parser;
use hosted_models::{HostedModel, HostedModelConfig};
use serde_json::json;
use std::time::Duration;

/// Send a text prompt to a hosted model and print what it generates.
///
/// Examples:
///   cargo run --example query -- --url https://lotr.hosted-models.runwayml.cloud/v1 "The one ring to"
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Model URL, e.g. https://my-model.hosted-models.runwayml.cloud/v1
    #[arg(long, env = "HOSTED_MODEL_URL", value_name = "URL")]
    url: String,

    /// Secret token, only needed for private models
    #[arg(long, env = "HOSTED_MODEL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Maximum number of characters to generate
    #[arg(long, default_value_t = 180)]
    max_characters: u32,

    /// Wait until the model is awake before querying
    #[arg(long)]
    wait: bool,

    /// Print the model's input/output description instead of querying
    #[arg(long)]
    info: bool,

    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = HostedModelConfig::new(&cli.url);
    if let Some(token) = &cli.token {
        config = config.with_token(token);
    }
    let model = HostedModel::new(config).context("Failed to create hosted model client")?;

    if cli.wait {
        model
            .wait_until_awake(Duration::from_secs(1))
            .await
            .context("Failed while waiting for the model to wake up")?;
    }

    if cli.info {
        let info = model.info().await?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let prompt = cli.prompt.context("A prompt is required unless --info is given")?;
    let output = model
        .query(json!({
            "prompt": prompt,
            "max_characters": cli.max_characters,
        }))
        .await?;

    match output.get("generated_text").and_then(|t| t.as_str()) {
        Some(text) => println!("{}", text),
        None => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}
