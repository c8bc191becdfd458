//! Process-unique identities for shared, immutable resources.
//!
//! GPU-side caches (gradient rows, image textures, glyph atlases) are keyed by
//! these ids rather than by pointer so an entry never aliases a later resource
//! that happens to reuse a freed allocation.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_resource_id() -> u64 {
    NEXT.fetch_add(1, Ordering::Relaxed)
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub(crate) u64);

        impl $name {
            #[inline]
            pub(crate) fn fresh() -> Self {
                Self($crate::id::next_resource_id())
            }

            #[inline]
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

pub(crate) use resource_id;
