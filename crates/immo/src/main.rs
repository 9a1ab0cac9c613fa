// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immo - unread-message counts and notifications for the classifieds backend.
//!
//! This is the binary entry point.

mod commands;
mod output;
mod shutdown;
mod terminal_host;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use immo_core::types::UserId;

/// Immo - unread-message counts and notifications.
#[derive(Parser, Debug)]
#[command(name = "immo", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll unread counts and print new-message notifications until interrupted.
    Watch {
        /// Signed-in user to poll for.
        #[arg(long)]
        user: String,
    },
    /// Print unread counts, or the exact count of one conversation.
    Count {
        #[arg(long)]
        user: String,
        /// Listing of the conversation; requires --from.
        #[arg(long, requires = "from")]
        context: Option<String>,
        /// Other participant of the conversation; requires --context.
        #[arg(long, requires = "context")]
        from: Option<String>,
    },
    /// Mark every message in one conversation as read.
    MarkRead {
        #[arg(long)]
        user: String,
        #[arg(long)]
        context: String,
        #[arg(long)]
        from: String,
    },
    /// Show the latest messages exchanged in one conversation.
    Inspect {
        #[arg(long)]
        user: String,
        #[arg(long)]
        context: String,
        #[arg(long)]
        with: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => immo_config::load_and_validate_path(path),
        None => immo_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            immo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let plain = cli.plain;
    let result = match cli.command {
        Some(Commands::Watch { user }) => {
            commands::watch(&config, UserId::from(user), plain).await
        }
        Some(Commands::Count {
            user,
            context,
            from,
        }) => {
            let conversation = context.zip(from);
            commands::count(&config, UserId::from(user), conversation, plain).await
        }
        Some(Commands::MarkRead {
            user,
            context,
            from,
        }) => commands::mark_read(&config, UserId::from(user), context, from, plain).await,
        Some(Commands::Inspect {
            user,
            context,
            with,
            limit,
        }) => commands::inspect(&config, UserId::from(user), context, with, limit).await,
        Some(Commands::Config) => commands::print_config(&config),
        None => {
            println!("immo: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("immo: error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // `immo` also matches the `immo_*` library targets by prefix.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("immo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn count_requires_both_conversation_parts() {
        let parsed = Cli::try_parse_from(["immo", "count", "--user", "me", "--context", "42"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "immo", "count", "--user", "me", "--context", "42", "--from", "u7",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn inspect_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from([
            "immo", "inspect", "--user", "me", "--context", "42", "--with", "u7",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Inspect { limit: 10, .. })
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = immo_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.app.name, "immo");
    }
}
