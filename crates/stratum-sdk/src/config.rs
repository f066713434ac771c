// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loading [`RendererSettings`] from RON files.

use std::path::{Path, PathBuf};
use stratum_core::RendererSettings;
use thiserror::Error;

/// Errors raised while reading or writing a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or written.
    #[error("cannot access settings file {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid settings RON.
    #[error("invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The settings could not be serialized.
    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Parses settings from a RON string. Missing fields take their defaults.
pub fn settings_from_str(text: &str) -> Result<RendererSettings, ConfigError> {
    Ok(ron::from_str(text)?)
}

/// Loads settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<RendererSettings, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let settings = settings_from_str(&text)?;
            log::info!("Loaded renderer settings from {}.", path.display());
            Ok(settings)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No settings file at {}, using defaults.",
                path.display()
            );
            Ok(RendererSettings::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Writes `settings` to `path` as pretty RON.
pub fn save_settings(settings: &RendererSettings, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    let text = ron::ser::to_string_pretty(settings, pretty)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = settings_from_str("(picking_enabled: false, max_programs: 8)").unwrap();
        assert!(!settings.picking_enabled);
        assert_eq!(settings.max_programs, 8);
        assert_eq!(settings.clear_color, RendererSettings::default().clear_color);
    }

    #[test]
    fn tag_filter_is_optional() {
        let settings = settings_from_str("(tag_filter: Some(\"hud|world\"))").unwrap();
        assert_eq!(settings.tag_filter.as_deref(), Some("hud|world"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        assert!(matches!(
            settings_from_str("(max_programs: \"many\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("stratum-settings-that-does-not-exist.ron");
        assert_eq!(load_settings(path).unwrap(), RendererSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let path = std::env::temp_dir().join(format!("stratum-settings-{}.ron", std::process::id()));
        let settings = RendererSettings {
            clear_color: [0.1, 0.2, 0.3, 1.0],
            log_level: "debug".into(),
            ..Default::default()
        };
        save_settings(&settings, &path).unwrap();
        let loaded = load_settings(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }
}
