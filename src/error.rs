use thiserror::Error;

/// Precondition failures surfaced to the user as a blocking notice.
/// Nothing is mutated and no history entry is pushed when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("create a mask selection first to use the stroke tool")]
    NoMask,

    #[error("select a color for this operation, not the mask tool itself")]
    MaskNotAllowed,

    #[error("grid size must be between 1x1 and {max}x{max}, got {width}x{height}")]
    InvalidGridSize { width: u32, height: u32, max: u32 },

    #[error("refine strength must be between 1 and 4, got {0}")]
    InvalidStrength(u8),
}

/// A color string that is neither a palette hex value nor the mask marker.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown palette color '{0}'")]
pub struct UnknownColor(pub String);

/// Errors from project files, raster import and export.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] Box<bincode::ErrorKind>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}
