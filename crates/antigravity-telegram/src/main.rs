//! Antigravity Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx GEMINI_API_KEY=yyy cargo run -p antigravity-telegram
//! ```

use std::path::PathBuf;

use antigravity_core::{config, Settings};
use antigravity_telegram::AntigravityBot;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Antigravity Bot - your mobile work brain on Telegram
#[derive(Parser, Debug)]
#[command(name = "antigravity-telegram")]
#[command(about = "Telegram bot that routes messages to an LLM by work mode")]
struct Args {
    /// Load environment variables from this file instead of the defaults
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            // Config directory first, then the working directory
            let env_path = config::env_file();
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
            }
            let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
        }
    }

    let settings = Settings::from_env();
    let base_level = settings
        .as_ref()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(args.verbose, &base_level);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    tracing::debug!(?settings, "Settings loaded");

    let bot = AntigravityBot::new(settings)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Antigravity Bot");
            println!("   Bot: @{}", username);
            println!("   Mode: {}", bot.state().settings().bot_mode);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}

/// Install the fmt subscriber. `RUST_LOG` wins over `-v` and `LOG_LEVEL`.
fn init_logging(verbose: u8, base_level: &str) {
    let filter = match verbose {
        0 => format!(
            "antigravity_telegram={base_level},antigravity_llm={base_level},\
             antigravity_bridge={base_level},antigravity_core={base_level},teloxide=warn"
        ),
        1 => "antigravity_telegram=debug,antigravity_llm=debug,antigravity_bridge=debug,\
              antigravity_core=debug,teloxide=info"
            .to_string(),
        2 => "antigravity_telegram=trace,antigravity_llm=trace,antigravity_bridge=trace,\
              antigravity_core=trace,teloxide=debug"
            .to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
