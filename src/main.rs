use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nevira::api::{ApiServer, ApiState};
use nevira::{
    ActionContext, ActionInvoker, AgentPrompt, Config, Desktop, DryRunDesktop, SessionController,
    SystemDesktop, builtin_registry,
};

/// Nevira - tool-dispatch gateway for a voice-driven personal assistant
#[derive(Parser)]
#[command(name = "nevira", version, about)]
struct Cli {
    /// Port to listen on (overrides config and environment)
    #[arg(long)]
    port: Option<u16>,

    /// Config file path (default: ~/.config/nevira/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log desktop commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print available actions as JSON
    Actions,
    /// Run a single action and print the result as JSON
    Invoke {
        /// Action name, e.g. "get_weather"
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Print the agent instructions and session greeting
    Prompt,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,nevira=info",
        1 => "info,nevira=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    let desktop: Arc<dyn Desktop> = if cli.dry_run {
        tracing::info!("dry run: desktop commands are logged, not executed");
        Arc::new(DryRunDesktop::new())
    } else {
        Arc::new(SystemDesktop::new())
    };

    let registry = builtin_registry(&config, desktop)?;
    let session = Arc::new(SessionController::new(config.grace_delay));
    let ctx = ActionContext::new(Arc::clone(&session), Arc::new(config.persona.clone()));
    let invoker = ActionInvoker::new(registry, ctx, config.action_timeout);

    match cli.command {
        Some(Command::Actions) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&invoker.available_actions())?
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Invoke { name, args }) => {
            let args: serde_json::Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args must be a JSON object: {e}"))?;
            let result = invoker.invoke(&name, &args).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if session.is_shutting_down() {
                // The exit timer ends the process after the grace delay
                std::future::pending::<()>().await;
            }
            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Command::Prompt) => {
            let prompt = AgentPrompt::build(&config.persona, invoker.registry());
            println!("{}\n{}", prompt.instructions, prompt.session);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            tracing::info!(
                persona = %config.persona.name,
                port = config.server.port,
                actions = invoker.registry().len(),
                "starting nevira"
            );
            let state = ApiState::new(invoker, config.server.api_key.take());
            ApiServer::new(state, config.server.port).run().await?;

            if session.is_shutting_down() {
                tracing::info!("waiting for exit timer");
                std::future::pending::<()>().await;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
