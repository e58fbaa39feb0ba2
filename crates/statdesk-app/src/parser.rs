//! CLI argument parsing structures.
//!
//! Every launch setting can also come from a `STATDESK_*` environment
//! variable, which in turn can be set from a `.env` file.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use statdesk_core::{DEFAULT_ASSET_PORT, DEFAULT_BACKEND_PORT, DEFAULT_READY_TIMEOUT_SECS};

/// Desktop launcher for the statdesk analysis backend and frontend.
#[derive(Parser, Debug)]
#[command(name = "statdesk")]
#[command(about = "Launch the statdesk backend, serve the frontend and open it")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub launch: LaunchArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings shared by every command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    /// Run the backend from source with a Python interpreter
    /// (defaults to on in debug builds; `--dev=false` forces a packaged run)
    #[arg(
        long,
        global = true,
        env = "STATDESK_DEV",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub dev: Option<bool>,

    /// Primary resource directory (defaults to the application directory)
    #[arg(long, global = true, env = "STATDESK_RESOURCE_DIR")]
    pub resource_dir: Option<PathBuf>,

    /// Frontend build output to serve (defaults to <resource-dir>/frontend/dist)
    #[arg(long, global = true, env = "STATDESK_DOCUMENT_ROOT")]
    pub document_root: Option<PathBuf>,

    /// Backend source directory for development mode
    #[arg(long, global = true, env = "STATDESK_BACKEND_SOURCE_DIR")]
    pub backend_source: Option<PathBuf>,

    /// Port the backend listens on
    #[arg(long, global = true, env = "STATDESK_BACKEND_PORT", default_value_t = DEFAULT_BACKEND_PORT)]
    pub backend_port: u16,

    /// Port for the frontend asset server (0 picks a free port)
    #[arg(long, global = true, env = "STATDESK_ASSET_PORT", default_value_t = DEFAULT_ASSET_PORT)]
    pub asset_port: u16,

    /// Seconds to wait for the backend to answer its readiness probe
    #[arg(
        long,
        global = true,
        env = "STATDESK_READY_TIMEOUT_SECS",
        default_value_t = DEFAULT_READY_TIMEOUT_SECS
    )]
    pub ready_timeout_secs: u64,

    /// Relaunch the backend when it exits unexpectedly
    #[arg(long, global = true, env = "STATDESK_RESTART")]
    pub restart: bool,

    /// Python interpreter to use in development mode
    #[arg(long, global = true, env = "STATDESK_PYTHON")]
    pub python: Option<String>,

    /// Serve without opening a browser; stop with Ctrl-C
    #[arg(long, global = true, env = "STATDESK_HEADLESS")]
    pub headless: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the backend, serve the frontend and open it (default)
    Run,

    /// Run only the backend until it is ready, then until Ctrl-C
    Backend,

    /// Show the resolved launch paths
    Paths {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl LaunchArgs {
    /// Whether to run the backend from source.
    pub fn is_dev(&self) -> bool {
        self.dev.unwrap_or(cfg!(debug_assertions))
    }
}

impl Cli {
    /// The command to run, defaulting to a full interactive run.
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
