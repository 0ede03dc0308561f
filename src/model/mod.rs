//! Resolved presentation model.
//!
//! Everything here is fully resolved: inheritance has been applied, colors
//! are RGB and positions are device pixels. Parsers in [`crate::pptx`]
//! produce these structures and renderers consume them.

mod resource;
mod slide;
mod style;
mod table;
mod text;

pub use resource::*;
pub use slide::*;
pub use style::*;
pub use table::*;
pub use text::*;
