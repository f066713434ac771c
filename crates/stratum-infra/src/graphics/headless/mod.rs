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

//! A software device that rasterizes bounding rectangles into CPU buffers.
//!
//! It exists for tests, tools and the sandbox: it executes every contract of
//! [`GraphicsDevice`](stratum_core::renderer::GraphicsDevice) faithfully
//! enough that pick ids and depths read back from its buffers are real.

mod device;
mod framebuffer;

pub use self::device::{DeviceEvent, DeviceStats, HeadlessDevice};
