use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "A minimal IRC client runtime with flood control and keepalive")]
pub struct Cli {
    /// Path to the configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a server, identify and stay online until interrupted
    ///
    /// Values not given on the command line are taken from the config file.
    ///
    /// Examples:
    ///   tether connect
    ///   tether connect --server irc.libera.chat:6667 --nick tether --join '#rust'
    Connect {
        /// Server address as host:port
        #[arg(short, long)]
        server: Option<String>,
        /// Nickname to register with
        #[arg(short, long)]
        nick: Option<String>,
        /// Username (ident)
        #[arg(short, long)]
        user: Option<String>,
        /// Real name shown in WHOIS
        #[arg(short, long)]
        realname: Option<String>,
        /// Channel to join once registered; may be repeated
        #[arg(short = 'j', long = "join")]
        channels: Vec<String>,
    },

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}
