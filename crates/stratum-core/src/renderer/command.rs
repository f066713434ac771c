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

//! Commands chunks send to the device.

use crate::state::{
    ClipPlanesCore, DrawModeCore, LightsCore, MaterialCore, RendererCore, TextureLayer,
    TransformCore, UniformValue, ViewCore,
};

/// One state-application call on the device, borrowing from the chunk's core.
#[derive(Debug, Clone, Copy)]
pub enum DeviceCommand<'a> {
    /// Line width, point size.
    Renderer(&'a RendererCore),
    /// Culling, depth and blend state.
    DrawMode(&'a DrawModeCore),
    /// Camera matrices.
    View(&'a ViewCore),
    /// Model matrix.
    Transform(&'a TransformCore),
    /// Light uniforms plus the ambient sum.
    Lights {
        /// The lights.
        lights: &'a LightsCore,
        /// Accumulated ambient color.
        ambient: [f32; 3],
    },
    /// Clip plane uniforms.
    ClipPlanes(&'a ClipPlanesCore),
    /// Material uniforms.
    Material(&'a MaterialCore),
    /// Binds one texture layer to a unit.
    Texture {
        /// Texture unit.
        unit: u32,
        /// The layer.
        layer: &'a TextureLayer,
    },
    /// Custom uniforms.
    Uniforms(&'a [(String, UniformValue)]),
    /// Sets the color written by subsequent pick draws.
    PickColor([u8; 4]),
}

/// One RGBA8 pixel read back from a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Pixel {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Pixel {
    /// Builds a pixel from RGBA bytes.
    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }

    /// The pixel as RGBA bytes.
    pub fn to_rgba(self) -> [u8; 4] {
        bytemuck::cast(self)
    }
}

impl From<[u8; 4]> for Pixel {
    fn from(rgba: [u8; 4]) -> Self {
        bytemuck::cast(rgba)
    }
}
