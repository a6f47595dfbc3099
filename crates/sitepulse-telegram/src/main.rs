//! Sitepulse bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p sitepulse-telegram
//! ```

use clap::Parser;
use sitepulse_telegram::{AppConfig, SitepulseBot};
use tracing_subscriber::EnvFilter;

/// Sitepulse - construction-site coordination bot
#[derive(Parser, Debug)]
#[command(name = "sitepulse")]
#[command(about = "Site coordination bot: logs, weather alerts, daily reports")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Local .env is a convenience for development; real deployments set
    // the environment directly.
    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "sitepulse=info,sitepulse_telegram=info,sitepulse_runtime=info,teloxide=warn",
        1 => "sitepulse=debug,sitepulse_telegram=debug,sitepulse_runtime=debug,teloxide=info",
        2 => "sitepulse=trace,sitepulse_telegram=trace,sitepulse_runtime=trace,teloxide=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Missing required configuration aborts here with the diagnostic; no
    // partial startup.
    let config = AppConfig::from_env()?;
    tracing::info!(
        site_id = %config.site_id,
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );

    let bot = SitepulseBot::new(config)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "bot initialized");
            println!("\nSitepulse site coordinator");
            println!("   Bot: @{username}");
            println!("\nOpen Telegram and send /start to begin");
            println!("   Press Ctrl+C to stop\n");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to reach Telegram");
            return Err(e.into());
        }
    }

    bot.run().await?;

    Ok(())
}
