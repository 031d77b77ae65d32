// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for drawing a frame.
//!
//! Tessera decides what to draw and when; a [`Renderer`] does the drawing.
//! Frame production drives it in a fixed order:
//!
//! ```text
//!   begin_frame ──► (rollback, if nothing changed)
//!        │
//!        ▼
//!   clear / draw / apply_effect, band by band
//!        │
//!        ▼
//!   commit
//! ```
//!
//! A layered frame draws every band but the topmost into a scratch buffer
//! ([`Target::Band`]). Each band's effect reads that band's buffer and writes
//! into the next band's target, which is the output buffer for the topmost
//! band. Scratch buffers live for one frame only.

use tessera_core::damage::Region;
use tessera_core::error::RenderError;
use tessera_core::output::{Output, OutputId};

use crate::plan::{EffectPass, RenderItem};

/// Where a draw call lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// The buffer that will be committed to the output.
    Output,
    /// The scratch buffer of the band with this index, counted from the
    /// bottom.
    Band(usize),
}

/// Draws frames for outputs.
///
/// Draw and effect failures are not fatal: frame production logs them, moves
/// on, and keeps the area damaged so the next frame tries again.
pub trait Renderer {
    /// Acquires the next buffer for `output` and returns its age: how many
    /// frames ago its contents were last presented, or zero if unknown.
    ///
    /// # Errors
    ///
    /// [`RenderError::Acquire`] if no buffer is available; the frame is
    /// skipped.
    fn begin_frame(&mut self, output: &Output) -> Result<u32, RenderError>;

    /// Releases the buffer acquired by [`begin_frame`](Self::begin_frame)
    /// without presenting anything.
    fn rollback(&mut self, output: OutputId);

    /// Fills `damage` on `target` with an opaque color.
    fn clear(&mut self, target: Target, damage: &Region, color: [f32; 4]);

    /// Draws one content.
    ///
    /// # Errors
    ///
    /// Any [`RenderError`]; the content is left out of this frame and
    /// redrawn by the next one.
    fn draw(&mut self, target: Target, item: &RenderItem<'_>) -> Result<(), RenderError>;

    /// Applies a composite effect to `source` and composes the result onto
    /// `dest`.
    ///
    /// # Errors
    ///
    /// Any [`RenderError`]; the effect is left out of this frame and
    /// reapplied by the next one.
    fn apply_effect(
        &mut self,
        source: Target,
        dest: Target,
        pass: &EffectPass<'_>,
    ) -> Result<(), RenderError>;

    /// Presents the output buffer. `damage` is in buffer coordinates (the
    /// output transform already undone).
    ///
    /// # Errors
    ///
    /// [`RenderError::Commit`] if the backend rejected the frame.
    fn commit(&mut self, output: OutputId, damage: &Region) -> Result<(), RenderError>;
}
