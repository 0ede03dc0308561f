//! JSON renderer for conversion results.

use crate::error::Result;
use crate::pptx::Conversion;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Serialize a conversion. Media bytes are left out; media entries carry
/// part name, content type and size only.
pub fn to_json(conversion: &Conversion, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(conversion)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(conversion)?,
    };
    Ok(json)
}

/// Serialize a conversion with default formatting.
pub fn to_json_default(conversion: &Conversion) -> Result<String> {
    to_json(conversion, JsonFormat::Pretty)
}
