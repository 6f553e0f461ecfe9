use agentsync_core::AgentSyncError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod app;
mod display;

#[derive(Parser)]
#[command(name = "agentsync")]
#[command(about = "AgentSync - supervisor-routed agents that draft and send email")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draft and send the job-application email
    Run {
        /// Address the email goes to (defaults to GMAIL_USER_EMAIL)
        #[arg(short, long)]
        recipient: Option<String>,

        /// Instruction sent to the supervisor instead of the built-in one
        #[arg(short, long)]
        instruction: Option<String>,

        /// Print every message of the run, not just the last one
        #[arg(long)]
        full_trace: bool,

        /// Report missing configuration as warnings instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Print the resolved configuration with secrets masked
    VerifyConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<AgentSyncError>().map_or(2, AgentSyncError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let settings = app::load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            recipient,
            instruction,
            full_trace,
            lenient,
        } => {
            let options = app::RunOptions {
                recipient,
                instruction,
                full_trace,
                lenient,
            };
            app::run(&settings, options).await
        }
        Command::VerifyConfig => {
            let path = cli.config.unwrap_or_else(agentsync_core::Settings::config_path);
            print!("{}", app::verify_report(&settings, &path));
            Ok(())
        }
    }
}
