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

//! Defines the error types for the rendering pipeline.

use crate::renderer::ids::RenderTargetId;
use std::fmt;

/// Errors related to resource allocation on the graphics device.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The device ran out of memory for the requested resource.
    OutOfMemory,
    /// A resource with the given handle was not found.
    NotFound,
    /// The provided handle is stale or otherwise invalid.
    InvalidHandle,
    /// An error originating from the specific device implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory => write!(f, "Device out of memory."),
            ResourceError::NotFound => write!(f, "Resource not found."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle."),
            ResourceError::BackendError(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Errors raised while building a program from generated source.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramError {
    /// The device rejected the source during compilation or linking.
    CompilationFailed {
        /// Label of the failing program (its state hash and variant).
        label: String,
        /// Diagnostic output from the device.
        details: String,
    },
    /// The device could not allocate the program.
    Resource(ResourceError),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::CompilationFailed { label, details } => {
                write!(f, "Program '{label}' failed to compile: {details}")
            }
            ProgramError::Resource(err) => write!(f, "Program resource error: {err}"),
        }
    }
}

impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProgramError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for ProgramError {
    fn from(err: ResourceError) -> Self {
        ProgramError::Resource(err)
    }
}

/// High-level errors returned while submitting a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// An offscreen render target could not be bound.
    TargetUnavailable(RenderTargetId),
    /// A resource failure during submission.
    Resource(ResourceError),
    /// An unexpected internal error.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TargetUnavailable(id) => {
                write!(f, "Render target {} is unavailable.", id.0)
            }
            RenderError::Resource(err) => write!(f, "Render resource error: {err}"),
            RenderError::Internal(msg) => write!(f, "Internal renderer error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

/// Errors returned by a pick query.
#[derive(Debug, Clone, PartialEq)]
pub enum PickError {
    /// Picking is switched off in the renderer settings.
    Disabled,
    /// The queried coordinates lie outside the canvas.
    OutOfBounds {
        /// Queried x.
        x: u32,
        /// Queried y.
        y: u32,
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
    },
    /// Refreshing the pick buffer failed.
    Render(RenderError),
}

impl fmt::Display for PickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickError::Disabled => write!(f, "Picking is disabled."),
            PickError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "Pick position ({x}, {y}) is outside the {width}x{height} canvas."),
            PickError::Render(err) => write!(f, "Pick buffer refresh failed: {err}"),
        }
    }
}

impl std::error::Error for PickError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PickError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for PickError {
    fn from(err: RenderError) -> Self {
        PickError::Render(err)
    }
}
