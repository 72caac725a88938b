mod config;
mod ec2;
mod handler;
mod mock;
mod pipeline;
mod types;
mod utils;

use anyhow::Result;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config::Settings::from_env()?;

    // The platform hands us an opaque event/context pair; nothing in the
    // pipeline reads it.
    let response = if settings.mock {
        let api = mock::MockEc2::sample();
        handler::handle(&api, &settings, Value::Null).await?
    } else {
        let conf = ec2::configure_aws(&settings).await;
        let api = ec2::Ec2TagClient::new(&conf);
        handler::handle(&api, &settings, Value::Null).await?
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
