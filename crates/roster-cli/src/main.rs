// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Terminal frontend
//
// Each subcommand stands in for one screen of the app.

mod commands;
mod state;

use clap::{Args, Parser, Subcommand};
use roster_core::AppSettings;
use state::AppState;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "roster", version, about = "Browse users, posts and tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List users (* marks favorites)
    Users(ListArgs),
    /// List posts
    Posts(ListArgs),
    /// List tasks
    Tasks(ListArgs),
    /// Show a post with its comments
    Post { id: u64 },
    /// List favorite users
    Favorites {
        #[arg(long)]
        search: Option<String>,
    },
    /// Add or remove a user from favorites
    Favorite { user_id: u64 },
    /// Print the effective settings, applying any given changes first
    Settings(SettingsArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Only show entries containing this text
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct SettingsArgs {
    /// Base URL of the REST service
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    users_page_size: Option<u32>,
    #[arg(long)]
    posts_page_size: Option<u32>,
    #[arg(long)]
    tasks_page_size: Option<u32>,
    /// Search quiet period in milliseconds
    #[arg(long)]
    search_debounce_ms: Option<u64>,
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl SettingsArgs {
    /// Overlay the given flags on `settings`; None when no flag was given
    fn apply(self, mut settings: AppSettings) -> Option<AppSettings> {
        let mut changed = false;
        if let Some(url) = self.api_url {
            settings.api_base_url = url;
            changed = true;
        }
        if let Some(size) = self.users_page_size {
            settings.users_page_size = size;
            changed = true;
        }
        if let Some(size) = self.posts_page_size {
            settings.posts_page_size = size;
            changed = true;
        }
        if let Some(size) = self.tasks_page_size {
            settings.tasks_page_size = size;
            changed = true;
        }
        if let Some(ms) = self.search_debounce_ms {
            settings.search_debounce_ms = ms;
            changed = true;
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout_secs = secs;
            changed = true;
        }
        changed.then_some(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roster_cli=info".parse().unwrap())
                .add_directive("roster_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting Roster v{}", env!("CARGO_PKG_VERSION"));

    let state = match AppState::new().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialize application state: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Users(args) => {
            commands::users(&state, args.pages, args.search).await;
            Ok(())
        }
        Command::Posts(args) => {
            commands::posts(&state, args.pages, args.search).await;
            Ok(())
        }
        Command::Tasks(args) => {
            commands::tasks(&state, args.pages, args.search).await;
            Ok(())
        }
        Command::Post { id } => commands::post_detail(&state, id).await,
        Command::Favorites { search } => {
            commands::favorites(&state, search);
            Ok(())
        }
        Command::Favorite { user_id } => commands::toggle_favorite(&state, user_id).await,
        Command::Settings(args) => {
            let update = args.apply(state.settings.get());
            commands::settings(&state, update)
        }
    };

    state.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
