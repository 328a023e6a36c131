use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::version;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Backend base URL (overrides `api.base_url`)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Serve everything from the built-in demo backend
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scroll through the job listings
    Browse {
        /// Pages to load past the first one
        #[arg(long, default_value_t = 3)]
        scrolls: usize,
        /// Scroll back toward the top this many times afterwards
        #[arg(long, default_value_t = 0)]
        back: usize,
        /// Open the detail panel on the first job
        #[arg(long, default_value_t = false)]
        panel: bool,
        /// Only list jobs of this domain
        #[arg(long)]
        domain: Option<String>,
    },
    /// Show the results of the last resume match
    Results {
        #[arg(long, default_value_t = 1)]
        scrolls: usize,
    },
    /// Upload a resume and wait for its match results
    Match {
        file: PathBuf,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,
    },
    /// List saved jobs, optionally toggling one first
    Saved {
        #[arg(long, value_name = "JOB_ID")]
        toggle: Option<String>,
    },
}
