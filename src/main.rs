//! VoiceNote CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use voicenote_sync::cli::{
    app::{load_merged_config, AppContext, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    auth_cmd, chat_cmd, config_cmd::handle_config_command, note_cmd, play_cmd,
    presenter::Presenter,
    record_cmd, upload_cmd,
};
use voicenote_sync::domain::config::AppConfig;
use voicenote_sync::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let store = XdgConfigStore::new();

    // Config commands work on the file alone
    let command = match cli.command {
        Commands::Config { action } => {
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        command => command,
    };

    let cli_config = AppConfig {
        api_url: cli.api_url.map(|url| url.trim_end_matches('/').to_string()),
        ..Default::default()
    };
    let config = load_merged_config(&store, cli_config).await;
    let ctx = AppContext::new(config, store);

    if let Err(e) = ctx.watch_timeout() {
        presenter.error(&format!("Invalid watch_timeout: {}", e));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    match command {
        Commands::Record { target } => record_cmd::run_record(&ctx, target).await,
        Commands::Upload { file, target } => upload_cmd::run_upload(&ctx, &file, target).await,
        Commands::Watch { note_id } => upload_cmd::run_watch(&ctx, &note_id).await,
        Commands::Play { note_id, audio } => play_cmd::run_play(&ctx, &note_id, audio).await,
        Commands::Show { note_id } => note_cmd::run_show(&ctx, &note_id).await,
        Commands::Chat { note_id } => chat_cmd::run_chat(&ctx, &note_id).await,
        Commands::Projects => note_cmd::run_projects(&ctx).await,
        Commands::Login { email, password } => auth_cmd::run_login(&ctx, &email, password).await,
        Commands::Logout => auth_cmd::run_logout(&ctx).await,
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
