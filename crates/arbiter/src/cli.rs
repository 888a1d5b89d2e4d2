use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "Verdict - change-approval gate with sandboxed dry runs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "verdict.toml")]
        path: PathBuf,
    },
    /// Evaluate one proposed change and print its risk card
    Check {
        /// Target file path inside the project
        #[arg(long)]
        file: String,
        /// Stated intent of the change
        #[arg(long)]
        intent: String,
        /// Read new contents from this file (stdin when omitted)
        #[arg(long)]
        contents: Option<PathBuf>,
        /// Prefer the remote sandbox backend
        #[arg(long, default_value = "false")]
        remote: bool,
    },
    /// Start the HTTP gateway server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}
