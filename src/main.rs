use anyhow::Context;
use clap::Parser;
use pagebridge::config::Config;
use pagebridge::gateway;

#[derive(Parser)]
#[command(
    name = "pagebridge",
    version,
    about = "Facebook Messenger webhook gateway with canned reply dispatch"
)]
struct Cli {
    /// Address to bind the webhook listener on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the webhook listener on
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Missing config values")?;

    gateway::run_gateway(&cli.host, cli.port, config).await
}
