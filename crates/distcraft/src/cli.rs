//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Distcraft node.
///
/// These override values from the configuration file.
#[derive(Parser, Debug)]
#[command(author, version, about = "Distcraft distributed-node server", long_about = None)]
pub struct Args {
    /// Configuration file path; created with defaults when missing
    #[arg(short, long, default_value = "distcraft.toml")]
    pub config: PathBuf,

    /// Port to listen on (loopback only)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("distcraft.toml"),
            port: None,
            verbose: false,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default() {
        let args = Args::default();
        assert_eq!(args.config, PathBuf::from("distcraft.toml"));
        assert!(args.port.is_none());
        assert!(!args.verbose);
        assert!(!args.debug);
    }

    #[test]
    fn flags_parse() {
        let args = Args::parse_from(["distcraft", "-p", "9000", "-v", "-d"]);
        assert_eq!(args.port, Some(9000));
        assert!(args.verbose);
        assert!(args.debug);
    }
}
