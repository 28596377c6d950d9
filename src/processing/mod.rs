//! Image-side domain types and the external stage contracts.
//!
//! # Data Flow
//! ```text
//! request parts
//!     → PathParser   → ProcessingOptions + source URL
//!     → Downloader   → DownloadedImage (released on drop)
//!     → etag.rs      → validator over options + source bytes
//!     → Processor    → output bytes
//! ```

pub mod collaborators;
pub mod etag;
pub mod options;
pub mod plain;

pub use collaborators::{
    Collaborators, DownloadedImage, Downloader, ParsedRequest, PathParser, Processor,
};
pub use options::{ImageType, ProcessingOptions, ResizeType};
