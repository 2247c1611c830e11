use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};

/// Returns the directory application state (currently just logs) lives in,
/// creating it when missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = state_home()?.join("orgtally");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(windows)]
fn state_home() -> Result<PathBuf> {
    let appdata =
        env::var("APPDATA").map_err(|_| anyhow!("APPDATA should be present on Windows"))?;
    Ok(PathBuf::from(appdata))
}

#[cfg(target_os = "linux")]
fn state_home() -> Result<PathBuf> {
    if let Ok(state) = env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(state));
    }
    let home =
        env::var("HOME").map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
    Ok(PathBuf::from(home).join(".local/state"))
}
