//! `xtabkit_log` v1:
//! Process-wide `tracing` subscriber for the xtabkit binaries.
//!
//! `RUST_LOG` wins over the verbosity-derived default filter.

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Crates whose events the default filter raises with verbosity.
const TUP_XTABKIT_TARGETS: [&str; 3] = ["xtabkit_crosstab", "xtabkit_io_xlsx", "xtabkit_cli"];

#[derive(Debug, Error)]
pub enum LogInitError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Default filter directive for `verbosity` (`-v` count).
///
/// 0 keeps xtabkit at `info`, 1 raises it to `debug`, 2+ to `trace`; other
/// crates stay at `warn`.
pub fn derive_log_filter(verbosity: u8) -> String {
    let c_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    std::iter::once("warn".to_string())
        .chain(
            TUP_XTABKIT_TARGETS
                .iter()
                .map(|c_target| format!("{c_target}={c_level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

/// Install a stderr fmt subscriber.
pub fn init_logging(verbosity: u8) -> Result<(), LogInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(derive_log_filter(verbosity)));
    let c_filter = filter.to_string();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| LogInitError::Install(err.to_string()))?;
    debug!(filter = %c_filter, "installed tracing subscriber");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_rejects_second_install() {
        let _ = init_logging(0);
        let err = init_logging(1).expect_err("subscriber already installed");
        assert!(matches!(err, LogInitError::Install(_)));
    }

    #[test]
    fn test_filter_follows_verbosity() {
        assert_eq!(
            derive_log_filter(0),
            "warn,xtabkit_crosstab=info,xtabkit_io_xlsx=info,xtabkit_cli=info"
        );
        assert!(derive_log_filter(1).contains("xtabkit_crosstab=debug"));
        assert!(derive_log_filter(5).contains("xtabkit_io_xlsx=trace"));
        assert!(EnvFilter::try_new(derive_log_filter(2)).is_ok());
    }
}
