use clap::Subcommand;
use pomocycle_core::Preset;

use crate::storage::Settings;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting (e.g. "timer.work_minutes", "notifications.bell")
    Get {
        /// Dot-separated key
        key: String,
    },
    /// Set a setting
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Print all settings as TOML
    Show,
    /// Print the settings file location
    Path,
    /// Overwrite durations with a preset (classic or extended)
    Preset {
        /// Preset name
        preset: Preset,
    },
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            println!("ok");
        }
        ConfigAction::Show => {
            let settings = Settings::load()?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigAction::Path => {
            println!("{}", Settings::path()?.display());
        }
        ConfigAction::Preset { preset } => {
            let mut settings = Settings::load()?;
            settings.apply_preset(preset);
            settings.save()?;
            println!("applied preset: {preset}");
        }
        ConfigAction::Reset => {
            Settings::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
