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

//! # Stratum Lanes
//!
//! The hot paths of scene compilation. Each lane is one stage of the dirty
//! cascade driven by `stratum-agents`: building entities against the caches,
//! computing and sorting state keys, compiling the draw and pick lists, and
//! replaying a list onto a device.

#![warn(missing_docs)]

pub mod render_lane;

pub use render_lane::*;
