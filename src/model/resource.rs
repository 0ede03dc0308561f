//! Media referenced by slides.

use serde::{Deserialize, Serialize};

/// Type of media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Audio,
    Video,
    Other,
}

impl ResourceType {
    /// Determine resource type from a content type.
    pub fn from_mime_type(mime: &str) -> Self {
        let mime_lower = mime.to_ascii_lowercase();
        if mime_lower.starts_with("image/") {
            ResourceType::Image
        } else if mime_lower.starts_with("audio/") {
            ResourceType::Audio
        } else if mime_lower.starts_with("video/") {
            ResourceType::Video
        } else {
            ResourceType::Other
        }
    }
}

/// A media part referenced by a picture or picture fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Part name inside the package, e.g. `ppt/media/image1.png`
    pub part_name: String,

    pub resource_type: ResourceType,

    /// Declared content type
    pub content_type: String,

    /// Binary data
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Size in bytes
    pub size: usize,
}

impl MediaAsset {
    pub fn new(part_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        let content_type = content_type.into();
        Self {
            part_name: part_name.into(),
            resource_type: ResourceType::from_mime_type(&content_type),
            content_type,
            size: data.len(),
            data,
        }
    }

    /// File name component of the part name.
    pub fn filename(&self) -> &str {
        self.part_name.rsplit('/').next().unwrap_or(&self.part_name)
    }

    /// Save the media bytes to a file.
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.data)
    }
}
