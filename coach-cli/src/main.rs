//! `stride-coach`: run the coach once, serve the chat bot, or check connectivity.

mod smoke;
mod wiring;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use coach_adapters::services::{ActivitySource, PlanStore};
use coach_adapters::telegram::TelegramClient;
use coach_config::CoachConfig;
use coach_kernel::{ChatBot, ChatGate, TaskScheduler, format_run_result};
use coach_primitives::calendar::parse_date;
use coach_telemetry::LogFormat;
use coach_tools::coaching_registry;

#[derive(Debug, Parser)]
#[command(name = "stride-coach", version, about = "Personal training-plan assistant")]
struct Cli {
    /// Log filter directive, e.g. `debug` or `coach_kernel=trace,info`. Defaults to `RUST_LOG`.
    #[arg(long, global = true, env = "COACH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: pretty, compact or json.
    #[arg(long, global = true, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one coaching invocation and print the reply.
    Run {
        /// Question from the athlete.
        #[arg(long, short)]
        question: Option<String>,
        /// Keep plan writes in memory instead of the plan store.
        #[arg(long)]
        dry_run: bool,
        /// Date to coach for (YYYY-MM-DD); defaults to today.
        #[arg(long, value_parser = parse_day)]
        today: Option<NaiveDate>,
    },
    /// Serve the Telegram bot until Ctrl-C.
    Bot,
    /// Check connectivity to every upstream service.
    Smoke {
        /// Also create and read back a scratch plan.
        #[arg(long)]
        write: bool,
    },
    /// Print the tool catalog as JSON.
    Tools,
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    coach_telemetry::init_tracing(cli.log_level.as_deref(), cli.log_format)?;

    match cli.command {
        Command::Run {
            question,
            dry_run,
            today,
        } => run(question, dry_run, today).await,
        Command::Bot => bot().await,
        Command::Smoke { write } => smoke(write).await,
        Command::Tools => tools(),
    }
}

async fn run(
    question: Option<String>,
    dry_run: bool,
    today: Option<NaiveDate>,
) -> Result<ExitCode> {
    let config = CoachConfig::from_env()?;
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let activities: Arc<dyn ActivitySource> = Arc::new(wiring::activity_source(&config)?);
    let notion = wiring::plan_store(&config)?;
    let plans: Arc<dyn PlanStore> = if dry_run {
        info!("dry run: plan writes stay in memory");
        Arc::new(wiring::dry_run_store(&notion, today).await?)
    } else {
        Arc::new(notion)
    };

    let service = wiring::coach_service(&config, activities, plans)?;
    let outcome = service.run_for(today, question).await.context("coaching run failed")?;

    println!("{}", format_run_result(outcome.result()));
    if dry_run {
        for ack in outcome.acknowledgements() {
            println!("  [{}] {}", ack.tool_name, ack.content);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn bot() -> Result<ExitCode> {
    let config = CoachConfig::from_env()?;
    let token = config.telegram.bot_token()?;
    let client = TelegramClient::new(token.expose())?;

    let activities: Arc<dyn ActivitySource> = Arc::new(wiring::activity_source(&config)?);
    let plans: Arc<dyn PlanStore> = Arc::new(wiring::plan_store(&config)?);
    let service = wiring::coach_service(&config, activities, plans)?;

    let bot = ChatBot::new(
        Arc::new(client),
        ChatGate::new(config.telegram.chat_id),
        Arc::new(service),
        TaskScheduler::default(),
    );
    bot.run_until(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
        }
    })
    .await;
    Ok(ExitCode::SUCCESS)
}

async fn smoke(write: bool) -> Result<ExitCode> {
    let config = CoachConfig::from_env()?;
    let activities = wiring::activity_source(&config)?;
    let plans = wiring::plan_store(&config)?;

    println!("=== Stride Coach Smoke Tests ===");
    let checks = smoke::run_checks(&activities, &plans, Utc::now().date_naive(), write).await;
    let failed = smoke::report(&checks);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn tools() -> Result<ExitCode> {
    let registry = coaching_registry()?;
    println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
    Ok(ExitCode::SUCCESS)
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
    fn parses_run_flags() {
        let cli = Cli::parse_from([
            "stride-coach",
            "--log-format",
            "json",
            "run",
            "--question",
            "Should I run today?",
            "--dry-run",
            "--today",
            "2026-02-18",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Run {
                question,
                dry_run,
                today,
            } => {
                assert_eq!(question.as_deref(), Some("Should I run today?"));
                assert!(dry_run);
                assert_eq!(today, NaiveDate::from_ymd_opt(2026, 2, 18));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Cli::try_parse_from(["stride-coach", "run", "--today", "18/02/2026"]).is_err());
    }
}
