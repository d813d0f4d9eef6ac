//! Host-side persistence: TOML settings and the task checklist.
//!
//! The timer core never touches these; the CLI reads them and hands the
//! core a plain `Configuration`.

mod settings;
mod tasks;

pub use settings::Settings;
pub use tasks::TaskList;

use std::path::PathBuf;

/// Returns the directory holding `config.toml` and `tasks.json`.
///
/// `POMOCYCLE_CONFIG_DIR` overrides the location outright. Otherwise this is
/// `~/.config/pomocycle[-dev]/`, with `POMOCYCLE_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match std::env::var_os("POMOCYCLE_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocycle-dev")
            } else {
                base_dir.join("pomocycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
