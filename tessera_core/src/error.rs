// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Nothing here is fatal to a running compositor except [`BackendError`] at
//! startup. Every other error is either returned from a handle-based mutator
//! that left state untouched, or logged and replaced by a safe default.

use thiserror::Error;

use crate::content::ContentId;
use crate::output::OutputId;

/// Failure to load or validate a [`CompositorConfig`](crate::config::CompositorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// An output section carries a scale that can never be applied.
    #[error("output {name:?}: invalid scale {scale}")]
    InvalidScale {
        /// Output name from the config.
        name: String,
        /// The rejected scale.
        scale: f64,
    },
    /// Two output sections share a name.
    #[error("output {0:?} is configured more than once")]
    DuplicateOutput(String),
}

/// A handle-based operation could not be applied.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The handle refers to a content that has been destroyed.
    #[error("stale content handle {0:?}")]
    StaleContent(ContentId),
    /// The operation needs a different content variant.
    #[error("content {id:?} is not a {expected}")]
    WrongKind {
        /// The offending handle.
        id: ContentId,
        /// Variant the operation requires.
        expected: &'static str,
    },
    /// The output has been removed.
    #[error("unknown output {0:?}")]
    UnknownOutput(OutputId),
}

/// A control-layer callback faulted.
///
/// The compositor never propagates this: it is logged and the callback is
/// treated as having returned its default (not intercepted).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The callback raised an error of its own.
    #[error("callback raised: {0}")]
    Raised(String),
    /// The callback returned something that is not a boolean decision.
    ///
    /// For bridges to dynamically typed runtimes, where a handler can hand
    /// back any value.
    #[error("callback returned an unexpected value: {0}")]
    UnexpectedReturn(String),
}

/// A draw, effect, or commit could not be completed.
///
/// Returned by renderer implementations. A failed draw or effect does not abort the frame: the
/// rest is still committed, and the failed area is damaged again so the
/// next frame retries it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The content has no backing buffer (texture not uploaded, icon unmapped).
    #[error("missing backing buffer")]
    MissingBuffer,
    /// A backing buffer could not be allocated.
    #[error("buffer allocation failed: {0}")]
    Allocation(String),
    /// The backend refused to hand out a buffer for this frame.
    #[error("could not acquire a buffer for output {0:?}")]
    Acquire(String),
    /// A named primitive is unknown to the renderer or got the wrong parameters.
    #[error("unsupported primitive {0:?}")]
    UnsupportedPrimitive(String),
    /// The frame commit was rejected.
    #[error("commit failed: {0}")]
    Commit(String),
}

/// The backend could not be brought up.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("backend failed to start: {reason}")]
pub struct BackendError {
    /// Human-readable failure reason from the backend.
    pub reason: String,
}
