// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content and surface handles.

use core::fmt;

/// A handle to a content in a [`ContentStore`](super::ContentStore).
///
/// Destroying a content bumps its slot's generation, so a handle kept past
/// `destroy` stops resolving even after the slot is reused. Control layers
/// living in another runtime hold contents as the packed integer from
/// [`ContentId::to_handle`] and get it back with
/// [`ContentStore::resolve`](super::ContentStore::resolve).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ContentId {
    /// Slot in the store. Reused after a destroy.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// How many contents occupied this slot before this one.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Packs the handle into one integer: generation high, slot low.
    #[must_use]
    pub const fn to_handle(self) -> u64 {
        ((self.generation as u64) << 32) | self.idx as u64
    }

    /// Unpacks [`ContentId::to_handle`]. The result may be stale; check it
    /// against the store before use.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each half is exactly 32 bits"
    )]
    pub const fn from_handle(handle: u64) -> Self {
        Self {
            idx: handle as u32,
            generation: (handle >> 32) as u32,
        }
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({self})")
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.idx)
        } else {
            write!(f, "#{}v{}", self.idx, self.generation)
        }
    }
}

/// An opaque reference to a client surface.
///
/// Surfaces belong to the client protocol layer; the core only passes them
/// back through the [`ClientSink`](crate::client::ClientSink).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);
