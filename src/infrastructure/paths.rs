//! Filesystem locations for configuration, fixtures and trace files.
//!
//! Directories follow the XDG base directory layout, with an
//! `EQUILINK_DATA_DIR` override for sandboxes and CI.

use std::env;
use std::path::PathBuf;

/// Application directory name under the XDG roots.
const APP_DIR: &str = "equilink-admin";

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}

/// Returns the data directory used for trace files.
///
/// Resolution order: `EQUILINK_DATA_DIR`, `$XDG_DATA_HOME/equilink-admin`,
/// `~/.local/share/equilink-admin`, then `./.equilink-admin`.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env::var_os("EQUILINK_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = env::var_os("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    home_dir().map_or_else(
        || PathBuf::from(".").join(format!(".{APP_DIR}")),
        |home| home.join(".local").join("share").join(APP_DIR),
    )
}

/// Returns the default configuration file path,
/// `$XDG_CONFIG_HOME/equilink-admin/config.toml` or `~/.config/equilink-admin/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".config")))
        .map(|base| base.join(APP_DIR).join("config.toml"))
}

/// Expands a leading `~` to the home directory.
///
/// # Examples
///
/// ```
/// use equilink_admin::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = home_dir() else {
        return path.to_string();
    };
    let home = home.to_string_lossy();

    if let Some(rest) = path.strip_prefix("~/") {
        format!("{home}/{rest}")
    } else if path == "~" {
        home.into_owned()
    } else {
        path.to_string()
    }
}
