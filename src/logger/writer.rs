//! File writer for the file log layer

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;

/// Opens the configured log file, creating its directory first.
///
/// The returned `Mutex<File>` is a `MakeWriter` for `tracing_subscriber`.
pub fn open_file_writer(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    Ok(Mutex::new(options.open(&config.path)?))
}
