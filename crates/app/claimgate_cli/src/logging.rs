pub mod formats;

use flexi_logger::{Logger, LoggerHandle};

use crate::Error;

/// Start logging to stderr. `RUST_LOG` takes precedence over `level`.
///
/// The returned handle must be held until exit.
pub fn init(level: &str) -> Result<LoggerHandle, Error> {
    let handle = Logger::try_with_env_or_str(level)?
        .format(formats::cli_format)
        .log_to_stderr()
        .start()?;

    Ok(handle)
}
