//! PresentationML: themes, layouts and masters, slides and the conversion
//! pipeline that ties them together.

pub mod color;
mod presentation;
pub mod slide;
pub mod style;
pub mod template;
pub mod text;
pub mod theme;

pub use presentation::{Conversion, Converter};
pub use slide::{build_slide, SlideContext};
pub use theme::Theme;
