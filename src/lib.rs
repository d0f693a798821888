//! Scraper Development Daemon
//!
//! A long-running autonomous orchestrator that consumes four work queues —
//! scraper-development requests, directory-crawl items, contact-extraction
//! targets, and market-discovery tasks — and produces generated,
//! test-validated scraper code or enriched organization data.
//!
//! # Modules
//!
//! - [`backend`] — the typed RPC surface against the document database
//! - [`browser`] — the headless-browser driver surface
//! - [`agent`] — code-generation subprocess supervision
//! - [`explore`] — the exploration stage (§4.2)
//! - [`prompt`] — prompt construction (§4.3)
//! - [`testing`] — the test stage (§4.5)
//! - [`diagnosis`] — auto-feedback on failing scrapers (§4.6)
//! - [`loops`] — the three auxiliary periodic loops (§4.7-§4.9)
//! - [`supervisor`] — the main scheduling loop tying every stage together
//! - [`domain`] — in-process views of backend-owned entities
//! - [`config`] — daemon configuration and loading
//! - [`cli`] — command-line argument parsing
//! - [`scratchpad`] — per-request scratch filesystem layout

pub mod agent;
pub mod backend;
pub mod browser;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod domain;
pub mod explore;
pub mod loops;
pub mod prompt;
pub mod scratchpad;
pub mod supervisor;
pub mod testing;

pub use backend::{Backend, BackendError, City, HttpBackend};
pub use browser::{BrowserDriver, BrowserError, ThirtyfourDriver};
pub use config::Config;
pub use supervisor::Supervisor;
