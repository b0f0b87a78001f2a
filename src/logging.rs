use anyhow::{bail, Result};
use tracing::Level;

/// Resolve the effective level: `-q` wins, each `-v` raises the configured
/// level one step.
pub fn effective_level(configured: &str, verbose: u8, quiet: bool) -> Result<Level> {
    if quiet {
        return Ok(Level::ERROR);
    }
    const LEVELS: [Level; 5] = [
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ];
    let Some(base) = ["error", "warn", "info", "debug", "trace"]
        .iter()
        .position(|name| *name == configured)
    else {
        bail!("unknown log level '{}'", configured);
    };
    let level = LEVELS[(base + verbose as usize).min(LEVELS.len() - 1)];
    Ok(level)
}

pub fn setup_logging(level: Level, quiet: bool) -> Result<()> {
    use tracing_subscriber::fmt;

    if quiet {
        let subscriber = fmt().with_max_level(level).without_time().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = fmt().with_max_level(level).with_target(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
