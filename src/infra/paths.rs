// src/infra/paths.rs — Path management
//
// All paths respect the HEALTHMATE_HOME environment variable for isolation.
// When HEALTHMATE_HOME is set, config and reports live under that directory.
// When unset, everything lives under ~/.healthmate/.

use std::path::PathBuf;

/// Returns the HEALTHMATE_HOME override, if set.
fn healthmate_home() -> Option<PathBuf> {
    std::env::var_os("HEALTHMATE_HOME").map(PathBuf::from)
}

/// Home directory
fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Configuration directory: $HEALTHMATE_HOME/ or ~/.healthmate/
pub fn config_dir() -> PathBuf {
    if let Some(home) = healthmate_home() {
        return home;
    }
    dirs_home().join(".healthmate")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Directory where exported reports and audio land by default
pub fn reports_dir() -> PathBuf {
    config_dir().join("reports")
}
