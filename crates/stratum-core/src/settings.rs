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

//! Global settings for the renderer.

use serde::{Deserialize, Serialize};

/// Settings shared by every scene an engine renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Clear color used when no renderer core overrides it.
    pub clear_color: [f32; 4],
    /// Whether pick queries are served. Disabling skips pick-buffer passes.
    pub picking_enabled: bool,
    /// Tag filter applied to new scenes. `None` lets every tag through.
    pub tag_filter: Option<String>,
    /// Log filter used when the environment does not provide one.
    pub log_level: String,
    /// Program count above which a warning is logged once per scene.
    pub max_programs: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            picking_enabled: true,
            tag_filter: None,
            log_level: "info".to_string(),
            max_programs: 256,
        }
    }
}
