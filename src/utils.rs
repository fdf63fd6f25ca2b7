use crate::error::ScriptError;
use std::{io::Read, path::Path};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FFI_POINTER_LOG";

/// Installs a stderr subscriber filtered by `FFI_POINTER_LOG`. Does nothing if
/// a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn read_script(path: Option<&Path>) -> Result<String, ScriptError> {
    let mut buf = String::new();
    let read = match path {
        Some(path) => {
            let mut file = std::fs::File::open(path).map_err(|e| {
                ScriptError::Io(format!("could not open file {} ({})", path.display(), e))
            })?;
            file.read_to_string(&mut buf)
        }
        None => std::io::stdin().read_to_string(&mut buf),
    };
    read.map_err(|e| ScriptError::Io(e.to_string()))?;
    Ok(buf)
}
