use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;
use relay_core::FilterMetadata;

#[derive(Debug, Parser)]
#[command(name = "relay", version, about = "Ingest Mattermost channels and chat with them")]
pub struct Cli {
    /// Backend base url (overrides the config file).
    #[arg(long, env = "RELAY_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// RON settings file.
    #[arg(long, default_value = "relay.ron", global = true)]
    pub config: PathBuf,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    pub log: LogTarget,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List teams.
    Teams,
    /// List channels of a team.
    Channels {
        /// Team id or display name.
        #[arg(long)]
        team: String,
    },
    /// List time range tokens.
    Ranges,
    /// Ingest a channel's posts into the backend.
    Ingest {
        /// Team id or display name.
        #[arg(long)]
        team: String,
        /// Channel id or display name.
        #[arg(long)]
        channel: String,
        /// Time range token, e.g. past_week.
        #[arg(long)]
        range: Option<String>,
        /// Refuse to ingest without a time range even if the config allows it.
        #[arg(long)]
        require_range: bool,
    },
    /// Ask a question and stream the answer.
    Ask {
        question: String,
        /// Metadata filter, key=value or key=a,b. Repeatable.
        #[arg(long = "filter")]
        filters: Vec<FilterMetadata>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
