//! `raincast.toml` settings.
//!
//! Every key is optional; missing keys take their defaults and out-of-range values
//! are clamped after loading. Command-line flags override what is loaded here.

mod defaults;
mod io;
mod types;

#[cfg(test)]
mod tests;

pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save, save_to_path};
pub use types::{
    ConfigError, DataSettings, ForecastSettings, OutputSettings, RaincastConfig,
    TrainingSettings,
};
