// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hearth - a persistent companion agent.
//!
//! This is the binary entry point: configuration, tracing, and the
//! subcommands that drive the ledger and the proactive pipeline.

mod admin;
mod app;
mod serve;

use clap::{Parser, Subcommand};
use hearth_core::{HearthError, SessionStatus};
use tokio::io::AsyncReadExt;

use crate::admin::ProactiveUpdate;
use crate::app::App;

/// Hearth - a persistent companion agent.
#[derive(Parser, Debug)]
#[command(name = "hearth", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the silence scanner and job processor until interrupted.
    Serve,
    /// Run one silence scan.
    Scan,
    /// Process queued trigger jobs once.
    Process {
        /// Maximum jobs to claim (defaults to proactive.batch_limit).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show or change a session's proactive messaging settings.
    Proactive {
        session_id: String,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
        /// Silence threshold in minutes.
        #[arg(long)]
        threshold_min: Option<i64>,
        /// Cooldown between silence triggers in minutes.
        #[arg(long)]
        cooldown_min: Option<i64>,
        /// Delivery target on the proactive channel (e.g. a chat id).
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Print the context pack of a session as JSON.
    Context {
        session_id: String,
        /// Number of recent messages (defaults to context.recent_messages).
        #[arg(long)]
        recent: Option<usize>,
    },
    /// List sessions as JSON, newest first.
    Sessions {
        /// Only sessions with this status (active or archived).
        #[arg(long)]
        status: Option<SessionStatus>,
    },
    /// Change a session's lifecycle status.
    Status {
        session_id: String,
        /// New status (active or archived).
        status: SessionStatus,
    },
    /// Rerank evidence read as a JSON array from stdin.
    Rerank {
        /// Items to keep (defaults to rerank.top_k; zero keeps all).
        #[arg(long)]
        top_k: Option<i64>,
    },
    /// Print the latest S4 and S60 summaries of a session.
    Summaries { session_id: String },
    /// Append a user/assistant exchange and run the summary windows.
    Append {
        session_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        assistant: String,
        #[arg(long, default_value = hearth_agent::DEFAULT_PLATFORM)]
        platform: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match hearth_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            hearth_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("hearth: use --help for available commands");
        return;
    };

    serve::init_tracing(&config.agent.log_level);

    let app = match App::open(config).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(app).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
            return;
        }
        Commands::Scan => admin::scan(&app).await,
        Commands::Process { limit } => admin::process(&app, limit).await,
        Commands::Proactive {
            session_id,
            enable,
            disable,
            threshold_min,
            cooldown_min,
            recipient,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = ProactiveUpdate {
                enabled,
                threshold_min,
                cooldown_min,
                recipient,
            };
            admin::proactive(&app, &session_id, update).await
        }
        Commands::Context { session_id, recent } => admin::context(&app, &session_id, recent).await,
        Commands::Sessions { status } => admin::list_sessions(&app, status).await,
        Commands::Status { session_id, status } => {
            admin::set_status(&app, &session_id, status).await
        }
        Commands::Rerank { top_k } => {
            let mut input = String::new();
            match tokio::io::stdin().read_to_string(&mut input).await {
                Ok(_) => admin::rerank_evidence(&app, &input, top_k),
                Err(e) => Err(HearthError::Internal(format!("reading stdin: {e}"))),
            }
        }
        Commands::Summaries { session_id } => admin::list_summaries(&app, &session_id).await,
        Commands::Append {
            session_id,
            user,
            assistant,
            platform,
        } => admin::append(&app, &session_id, &platform, &user, &assistant).await,
    };

    let close = app.close().await;
    match result.and_then(|output| close.map(|()| output)) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_proactive_flags() {
        let cli = Cli::parse_from([
            "hearth",
            "proactive",
            "s1",
            "--enable",
            "--threshold-min",
            "30",
        ]);
        let Some(Commands::Proactive {
            session_id,
            enable,
            threshold_min,
            ..
        }) = cli.command
        else {
            panic!("expected proactive subcommand");
        };
        assert_eq!(session_id, "s1");
        assert!(enable);
        assert_eq!(threshold_min, Some(30));
    }

    #[test]
    fn parses_session_status_and_rerank() {
        let cli = Cli::parse_from(["hearth", "status", "s1", "archived"]);
        let Some(Commands::Status { session_id, status }) = cli.command else {
            panic!("expected status subcommand");
        };
        assert_eq!(session_id, "s1");
        assert_eq!(status, SessionStatus::Archived);

        let cli = Cli::parse_from(["hearth", "sessions", "--status", "active"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Sessions {
                status: Some(SessionStatus::Active)
            })
        ));

        let cli = Cli::parse_from(["hearth", "rerank", "--top-k", "3"]);
        assert!(matches!(cli.command, Some(Commands::Rerank { top_k: Some(3) })));

        assert!(Cli::try_parse_from(["hearth", "status", "s1", "closed"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = hearth_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.agent.name, "hearth");
    }
}
