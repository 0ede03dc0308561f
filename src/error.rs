//! Error types for the pptx2html library.
//!
//! Only fatal conditions are errors. Anything a conversion can recover from
//! is recorded as a [`Diagnostic`](crate::diagnostics::Diagnostic) instead.

use crate::diagnostics::Diagnostic;
use crate::xml::XmlError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pptx2html operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable code carried by every fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FileNotFound,
    InvalidPptx,
    InputReadFailed,
    NoSlides,
    ContentTypeUnresolved,
    MalformedPackage,
    PartNotFound,
    OutputWriteFailed,
    XmlParseFailed,
    Cancelled,
    StrictViolation,
}

impl ErrorCode {
    /// Stable code string, e.g. `E1001`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::FileNotFound => "E1001",
            ErrorCode::InvalidPptx => "E1002",
            ErrorCode::InputReadFailed => "E1003",
            ErrorCode::NoSlides => "E1004",
            ErrorCode::ContentTypeUnresolved => "E1005",
            ErrorCode::MalformedPackage => "E1006",
            ErrorCode::PartNotFound => "E1007",
            ErrorCode::OutputWriteFailed => "E2002",
            ErrorCode::XmlParseFailed => "E3001",
            ErrorCode::Cancelled => "E4001",
            ErrorCode::StrictViolation => "E4002",
        }
    }

    /// Upper-case name of the code, e.g. `FILE_NOT_FOUND`.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::InvalidPptx => "INVALID_PPTX",
            ErrorCode::InputReadFailed => "INPUT_READ_FAILED",
            ErrorCode::NoSlides => "NO_SLIDES",
            ErrorCode::ContentTypeUnresolved => "CONTENT_TYPE_UNRESOLVED",
            ErrorCode::MalformedPackage => "MALFORMED_PACKAGE",
            ErrorCode::PartNotFound => "PART_NOT_FOUND",
            ErrorCode::OutputWriteFailed => "OUTPUT_WRITE_FAILED",
            ErrorCode::XmlParseFailed => "XML_PARSE_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::StrictViolation => "STRICT_VIOLATION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal errors that abort a conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not point at a file.
    #[error("Input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// I/O error while reading the input.
    #[error("Failed to read input file: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable OPC package.
    #[error("Input file is not a valid .pptx: {0}")]
    InvalidPackage(String),

    /// The package contains no slide parts.
    #[error("No slides found in presentation")]
    NoSlides,

    /// A part reachable from the package root has no declared content type.
    #[error("No content type declared for part: {part}")]
    ContentType { part: String },

    /// Relationship structure is unusable (broken inheritance chain, cycle).
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// A named part is absent from the package.
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// The model could not be serialized.
    #[error("Failed writing output: {0}")]
    Output(#[from] serde_json::Error),

    /// A part that the conversion cannot do without failed to parse.
    #[error("Invalid or unexpected XML content at {part}: {source}")]
    XmlParse {
        part: String,
        #[source]
        source: XmlError,
    },

    /// The conversion was cancelled between slides.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Strict mode promoted an error diagnostic to a fatal error.
    #[error("Strict mode: {0}")]
    Strict(Box<Diagnostic>),
}

impl Error {
    /// The machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::FileNotFound { .. } => ErrorCode::FileNotFound,
            Error::Io(_) => ErrorCode::InputReadFailed,
            Error::InvalidPackage(_) => ErrorCode::InvalidPptx,
            Error::NoSlides => ErrorCode::NoSlides,
            Error::ContentType { .. } => ErrorCode::ContentTypeUnresolved,
            Error::MalformedPackage(_) => ErrorCode::MalformedPackage,
            Error::PartNotFound(_) => ErrorCode::PartNotFound,
            Error::Output(_) => ErrorCode::OutputWriteFailed,
            Error::XmlParse { .. } => ErrorCode::XmlParseFailed,
            Error::Cancelled => ErrorCode::Cancelled,
            Error::Strict(_) => ErrorCode::StrictViolation,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::PartNotFound("(unnamed zip entry)".to_string())
            }
            other => Error::InvalidPackage(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse {
            part: String::new(),
            source: XmlError::new(err.to_string(), 0),
        }
    }
}
