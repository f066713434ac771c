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

use stratum_core::renderer::Pixel;

/// Converts a linear `[0, 1]` color to RGBA8.
pub(crate) fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// A screen-space rectangle with a constant window depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coverage {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    pub depth: f32,
}

/// One color + depth attachment pair.
#[derive(Debug, Clone)]
pub(crate) struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Pixel>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Pixel::default(); len],
            depth: vec![1.0; len],
        }
    }

    pub fn clear(&mut self, rgba: [u8; 4]) {
        self.color.fill(Pixel::from(rgba));
        self.depth.fill(1.0);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.color.get((y * self.width + x) as usize).copied()
    }

    /// Row-major RGBA8 bytes of the color attachment.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color)
    }

    /// Writes `rgba` over `area`, honoring the depth test. Returns the number
    /// of pixels written.
    pub fn fill(&mut self, area: Coverage, rgba: [u8; 4], depth_test: bool, depth_write: bool) -> u32 {
        let mut written = 0;
        for y in area.y0..area.y1.min(self.height) {
            for x in area.x0..area.x1.min(self.width) {
                let i = (y * self.width + x) as usize;
                if depth_test && area.depth >= self.depth[i] {
                    continue;
                }
                self.color[i] = Pixel::from(rgba);
                if depth_write {
                    self.depth[i] = area.depth;
                }
                written += 1;
            }
        }
        written
    }
}
