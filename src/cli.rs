//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::clamp_workers;

/// Scraper Development Daemon.
#[derive(Debug, Parser)]
#[command(name = "scraperd", version, about = "Autonomous scraper development daemon")]
pub struct Cli {
    /// Path to a config file, overriding the default fallback chain.
    #[arg(short = 'f', long = "config")]
    pub config: Option<PathBuf>,

    /// Number of concurrent scraper-development workers, clamped to [1, 10].
    #[arg(short = 'w', long = "workers", default_value_t = 1)]
    pub workers: u32,

    /// Restrict scraper-development claims to one city (slug or name).
    #[arg(short = 'c', long = "city")]
    pub city: Option<String>,

    /// Echo per-worker log lines to stdout in addition to the daemon log file.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// One-shot: run only the directory loop once, then exit.
    #[arg(short = 'd', long = "directory")]
    pub directory: bool,

    /// One-shot: run only the contact-extraction loop once, then exit.
    #[arg(long = "contact")]
    pub contact: bool,

    /// One-shot: run only the market-discovery loop once, then exit.
    #[arg(short = 'D', long = "discovery")]
    pub discovery: bool,
}

impl Cli {
    pub fn clamped_workers(&self) -> u32 {
        clamp_workers(self.workers)
    }

    /// Whether any one-shot mode was requested (mutually exclusive with the
    /// ordinary supervisor run).
    pub fn one_shot_mode(&self) -> Option<OneShotMode> {
        if self.directory {
            Some(OneShotMode::Directory)
        } else if self.contact {
            Some(OneShotMode::Contact)
        } else if self.discovery {
            Some(OneShotMode::Discovery)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShotMode {
    Directory,
    Contact,
    Discovery,
}
