//! CLI argument definitions for the `alloypro` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use alloy_core::types::{OrderId, WorkStatus};

/// AlloyPro - a field technician's inspection copilot.
#[derive(Parser, Debug)]
#[command(name = "alloypro", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List service orders.
    Orders {
        /// Only show orders with this status (e.g. `new`, `in_progress`).
        #[arg(long)]
        status: Option<WorkStatus>,
    },
    /// Open a new service order from an intake form saved as JSON.
    New {
        /// Path to the intake JSON.
        #[arg(long = "from")]
        from: PathBuf,
    },
    /// Show one service order in full.
    Show {
        /// Order id, e.g. WO-1042.
        id: String,
    },
    /// Run a guided inspection with simulated dictation.
    Inspect {
        /// Order to inspect.
        #[arg(long)]
        order: String,
        /// Utterance to dictate. Repeat for one utterance per step.
        #[arg(long = "say")]
        say: Vec<String>,
        /// Simulate the technician declining camera/microphone access.
        #[arg(long)]
        deny_permissions: bool,
    },
    /// Send a purchase request for one of an order's recommended parts.
    Purchase {
        #[arg(long)]
        order: String,
        #[arg(long)]
        sku: String,
    },
}

impl Command {
    /// Order id named by the subcommand, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Command::Orders { .. } | Command::New { .. } => None,
            Command::Show { id } => Some(OrderId::new(id.trim())),
            Command::Inspect { order, .. } | Command::Purchase { order, .. } => {
                Some(OrderId::new(order.trim()))
            }
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ALLOYPRO_CONFIG env var > platform default (~/.alloypro/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ALLOYPRO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level used when `RUST_LOG` is not set.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if !config_level.trim().is_empty() {
            return config_level.to_string();
        }
        "info".to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".alloypro").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".alloypro").join("config.toml");
    }
    PathBuf::from("config.toml")
}
