//! Models module for measure rhythm reconstruction
//!
//! Plain data delivered by the recognition layer (notes, stems, slurs),
//! plus the identifiers, geometry and time values shared by every pass.

pub mod geometry;
pub mod ids;
pub mod note;
pub mod slur;
pub mod time;

// Re-export commonly used types
pub use geometry::*;
pub use ids::*;
pub use note::*;
pub use slur::*;
pub use time::*;
