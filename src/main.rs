mod api;
mod app;
mod commands;
mod config;
mod event;
mod logging;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nursestudy")]
#[command(about = "A terminal course tracker for nursing students")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/nursestudy/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL (overrides api.url)
  #[arg(long)]
  api_url: Option<String>,

  /// User whose courses are shown (overrides api.user_id)
  #[arg(short, long)]
  user_id: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line wins over file and environment
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  if let Some(user_id) = args.user_id {
    config.api.user_id = user_id;
  }

  let _log_guard = logging::init(config.log_level())?;

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
