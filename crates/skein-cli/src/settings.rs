//! Runtime settings, read from an optional TOML file and `SKEIN_*`
//! environment variables.

use std::path::{Path, PathBuf};

use config::{
  Config, ConfigError, Environment, File,
  builder::{ConfigBuilder, DefaultState},
};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
  /// SQLite database file holding the index.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("skein.db") }

impl Settings {
  /// Layer `path` (if it exists) under the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix("SKEIN")),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    let mut settings: Self = builder.build()?.try_deserialize()?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
