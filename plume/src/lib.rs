//! Plume — storage-agnostic entity↔document mapping.
//!
//! This facade crate re-exports the Plume sub-crates through a single
//! dependency. Import everything you need with:
//!
//! ```ignore
//! use plume::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate          |
//! |----------|---------|----------------|
//! | `memory` | no      | `plume-memory` |

// Re-export sub-crates as public modules so they're accessible as
// `plume::plume_core`, `plume::plume_data`, etc.
//
// The derive macro uses `proc-macro-crate` to detect whether the user
// depends on `plume` (facade) or on the individual crates, and generates
// the correct paths.
pub extern crate plume_core;
pub extern crate plume_macros;

// Re-export everything from plume-core at the top level for convenience.
pub use plume_core::*;

pub use plume_data;

#[cfg(feature = "memory")]
pub use plume_memory;

/// The `#[derive(Entity)]` macro. Shares its name with the
/// [`Entity`](plume_core::Entity) trait it implements.
pub use plume_macros::Entity;

pub mod prelude {
    //! Re-exports of the most commonly used Plume types.
    pub use crate::plume_core::prelude::*;
    pub use crate::plume_data::prelude::*;
    pub use crate::Entity;
    #[cfg(feature = "memory")]
    pub use crate::plume_memory::MemoryBackend;
}
