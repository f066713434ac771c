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

//! Pick-buffer encodings.
//!
//! The color-index pass writes `pick_id` into the RGB channels (`r + g*256 +
//! b*65536`, id 0 meaning "nothing"). The ray-pick pass writes window-space
//! depth in `[0, 1]` as a big-endian 32-bit fixed-point value across RGBA.

use crate::renderer::command::Pixel;

/// Largest pick id representable in 24 bits of color.
pub const MAX_PICK_ID: u32 = 0x00FF_FFFF;

/// Encodes a pick id as an opaque color. Ids above [`MAX_PICK_ID`] wrap, so
/// the draw-list compiler never hands them out.
pub fn encode_pick_id(pick_id: u32) -> [u8; 4] {
    [
        (pick_id & 0xFF) as u8,
        ((pick_id >> 8) & 0xFF) as u8,
        ((pick_id >> 16) & 0xFF) as u8,
        0xFF,
    ]
}

/// Decodes a pick id written by [`encode_pick_id`].
pub fn decode_pick_id(pixel: Pixel) -> u32 {
    pixel.r as u32 + pixel.g as u32 * 256 + pixel.b as u32 * 65536
}

/// Packs a depth value (clamped to `[0, 1]`) into RGBA.
pub fn encode_depth(depth: f32) -> [u8; 4] {
    let fixed = (depth.clamp(0.0, 1.0) as f64 * u32::MAX as f64).round() as u32;
    fixed.to_be_bytes()
}

/// Unpacks a depth value written by [`encode_depth`].
pub fn decode_depth(pixel: Pixel) -> f32 {
    (u32::from_be_bytes(pixel.to_rgba()) as f64 / u32::MAX as f64) as f32
}
