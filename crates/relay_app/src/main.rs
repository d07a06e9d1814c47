mod cli;
mod config;
mod render;
mod session;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use relay_core::{time_range, AlertKind, ChatError, ChatStatus, StageId};
use relay_engine::{HttpBackend, StreamConsumer};

use cli::{Cli, Command};
use render::TerminalObserver;
use session::Session;

fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level(), Path::new("./relay.log"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(&cli.config);
    let settings = config.backend_settings(cli.base_url.as_deref());
    engine_info!("Using backend {}", settings.base_url);
    let backend = Arc::new(HttpBackend::new(&settings).context("invalid backend settings")?);

    match cli.command {
        Command::Ranges => {
            for option in time_range::catalog() {
                println!("{:<20} {}", option.key, option.label);
            }
            Ok(())
        }
        Command::Teams => {
            let mut session = Session::new(backend, config.time_range_policy(false));
            session.load_root().await?;
            print_stage(&session, StageId::Team);
            Ok(())
        }
        Command::Channels { team } => {
            let mut session = Session::new(backend, config.time_range_policy(false));
            session.load_root().await?;
            session.choose(StageId::Team, &team).await?;
            print_stage(&session, StageId::Channel);
            Ok(())
        }
        Command::Ingest {
            team,
            channel,
            range,
            require_range,
        } => {
            let mut session = Session::new(backend, config.time_range_policy(require_range));
            session.load_root().await?;
            session.choose(StageId::Team, &team).await?;
            session.choose(StageId::Channel, &channel).await?;
            if let Some(range) = range {
                session.choose(StageId::TimeRange, &range).await?;
            }
            session.ingest().await
        }
        Command::Ask { question, filters } => {
            let mut session = Session::new(backend.clone(), config.time_range_policy(false));
            let mut consumer = StreamConsumer::new(HttpBackend::clone(&backend));
            let observer = TerminalObserver::default();
            match consumer.ask(&question, filters, &observer).await {
                Ok(ChatStatus::Complete) => Ok(()),
                Ok(_) => {
                    session.alert("Error processing chat request", AlertKind::Error);
                    let reason = consumer.exchange().failure().unwrap_or("unknown failure");
                    anyhow::bail!("chat request failed: {reason}")
                }
                Err(err @ ChatError::EmptyQuestion) => {
                    session.alert(err.to_string(), AlertKind::Warning);
                    Err(err.into())
                }
            }
        }
    }
}

fn print_stage(session: &Session, stage: StageId) {
    if let Some(view) = session.state().view().stage(stage) {
        render::print_options(view);
    }
}
