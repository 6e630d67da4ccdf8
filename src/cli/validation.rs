//! Value parsers for CLI arguments clap cannot check on its own.

use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Largest rollback accepted in one invocation.
const MAX_ROLLBACK_STEPS: u32 = 100;

/// Longest DNS name.
const MAX_HOST_LEN: usize = 253;

/// Port in 1..=65535.
pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("Port 0 is not allowed; use 1-65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("Port must be a number between 1 and 65535, got '{value}'")),
    }
}

/// Existing, readable regular file.
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("Configuration file does not exist or is not a file: '{value}'"));
    }
    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{value}': {e}"))
}

pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    let steps: u32 = value
        .parse()
        .map_err(|_| format!("Rollback steps must be a positive number, got '{value}'"))?;
    if steps == 0 || steps > MAX_ROLLBACK_STEPS {
        return Err(format!(
            "Rollback steps must be between 1 and {MAX_ROLLBACK_STEPS}"
        ));
    }
    Ok(steps)
}

/// Hostname or IP address. Dotted-digit strings must be valid IPv4.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();
    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > MAX_HOST_LEN {
        return Err(format!("Host address is longer than {MAX_HOST_LEN} characters"));
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') && host.parse::<Ipv4Addr>().is_err() {
        return Err(format!("Invalid IPv4 address: '{value}'"));
    }
    Ok(host.to_string())
}
