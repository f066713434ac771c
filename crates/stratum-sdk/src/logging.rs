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

//! Logger initialisation.

use stratum_core::RendererSettings;

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` wins when set; otherwise `settings.log_level` is used. Returns
/// `false` if a logger was already installed.
pub fn init_logging(settings: &RendererSettings) -> bool {
    let env = env_logger::Env::default().default_filter_or(settings.log_level.as_str());
    match env_logger::Builder::from_env(env).format_timestamp_millis().try_init() {
        Ok(()) => {
            log::debug!("Logging initialised at '{}'.", settings.log_level);
            true
        }
        Err(_) => false,
    }
}
