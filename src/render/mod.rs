//! Output rendering for conversion results.
//!
//! # Example
//!
//! ```no_run
//! use pptx2html::{convert_file, render::*, ConvertOptions};
//!
//! let conversion = convert_file("deck.pptx", &ConvertOptions::default())?;
//! let json = to_json(&conversion, JsonFormat::Pretty)?;
//! # Ok::<(), pptx2html::Error>(())
//! ```

mod json;

pub use json::{to_json, to_json_default, JsonFormat};
