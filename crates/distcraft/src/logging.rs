//! Logging setup.
//!
//! Maps the CLI verbosity flags onto tracing filter levels: the default
//! floor is `info` (INFO and ERROR always visible), `--verbose` additionally
//! enables `debug`, and `--debug` enables `trace`. `RUST_LOG` overrides
//! everything.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Args;

pub fn setup_logging(args: &Args) -> Result<()> {
    let level = if args.debug {
        "trace"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_setup_does_not_panic() {
        let args = Args::default();
        // The global subscriber can only be installed once per process;
        // both outcomes are acceptable here.
        let result = setup_logging(&args);
        assert!(result.is_ok() || result.is_err());
    }
}
