//! Processing options and output image types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Jpeg,
    Png,
    Webp,
    Gif,
    Ico,
}

impl ImageType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Ico => "image/x-icon",
        }
    }

    /// File extension used in `Content-Disposition`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Ico => "ico",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown image type: {0:?}")]
pub struct UnknownImageType(pub String);

impl FromStr for ImageType {
    type Err = UnknownImageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            "ico" => Ok(Self::Ico),
            _ => Err(UnknownImageType(s.to_string())),
        }
    }
}

/// How the image is fitted into the target dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeType {
    #[default]
    Fit,
    Fill,
    Crop,
}

/// Parsed, immutable description of the requested transformation.
///
/// Built once per request by the path parser. The response encoder reads
/// `format`; the whole value feeds the ETag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub resize: ResizeType,
    pub width: u32,
    pub height: u32,
    pub enlarge: bool,
    pub quality: u8,
    pub format: ImageType,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            resize: ResizeType::Fit,
            width: 0,
            height: 0,
            enlarge: false,
            quality: 80,
            format: ImageType::Jpeg,
        }
    }
}
