//! Configuración de bitácora.

use env_logger::Builder;
use log::{trace, LevelFilter};
use std::io::Write;

/// Configura la bitácora con la verbosidad indicada.
///
/// La bitácora se escribe a stderr, por lo cual nunca se mezcla con
/// ensamblador emitido a stdout.
pub fn configure(verbosity: u64) -> Result<(), String> {
    let log_level = level(verbosity)?;

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log_level)
        .try_init()
        .map_err(|error| error.to_string())?;

    trace!("Logger verbosity {}", log_level);
    Ok(())
}

fn level(verbosity: u64) -> Result<LevelFilter, String> {
    match verbosity {
        0 => Ok(LevelFilter::Error),
        1 => Ok(LevelFilter::Warn),
        2 => Ok(LevelFilter::Info),
        3 => Ok(LevelFilter::Debug),
        4 => Ok(LevelFilter::Trace),
        _ => Err(String::from("Verbosity is capped at -vvvv")),
    }
}
