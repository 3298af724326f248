pub mod admin;
pub mod api;
pub mod app;
pub mod cli;
pub mod conversation;
pub mod history;
pub mod models;
pub mod platform;
pub mod render;
pub mod session;
pub mod storage;
pub mod text;

use app::Context;
use cli::{ Args, Command };
use log::info;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("API URL: {}", args.api_url);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Storage Type: {}", args.storage_type);
    info!("Data Directory: {}", args.resolve_data_dir().display());
    info!("History Cap: {}", args.history_cap);
    match args.storage_quota_bytes {
        Some(quota) => info!("Storage Quota: {} bytes", quota),
        None => info!("Storage Quota: unlimited"),
    }
    info!("Scroll Threshold: {}", args.scroll_threshold);
    info!("Clipboard Command: {}", args.clipboard_cmd.as_deref().unwrap_or("(none)"));
    info!("Speech Command: {}", args.speech_cmd.as_deref().unwrap_or("(none)"));
    info!("-------------------------");

    let command = args.command.clone().unwrap_or(Command::Chat);
    let ctx = Context::from_args(args)?;
    match &command {
        Command::Chat => app::chat::run_chat(&ctx).await,
        Command::Ask { question } => app::chat::run_ask(&ctx, &question.join(" ")).await,
        Command::Suggestions => app::chat::run_suggestions(&ctx).await,
        Command::Health => app::chat::run_health(&ctx).await,
        Command::History { action } => app::chat::run_history(&ctx, action).await,
        Command::Session => app::chat::run_session(&ctx).await,
        Command::Admin { action } => app::admin::run_admin(&ctx, action).await,
    }
}
