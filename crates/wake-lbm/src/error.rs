use thiserror::Error;

pub type Result<T, E = LbmError> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LbmError {
    /// The obstacle geometry cannot be rasterised (degenerate polygon, bad radius, ...).
    #[error("invalid obstacle geometry: {0}")]
    InvalidGeometry(String),
    /// A simulation parameter is out of its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

impl LbmError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        LbmError::InvalidParameter { name, reason: reason.into() }
    }
}

/// Checks that a grid extent is usable, returning it unchanged.
pub(crate) fn check_extent(width: usize, height: usize) -> Result<(usize, usize)> {
    if width == 0 {
        return Err(LbmError::parameter("width", "grid width must be positive"));
    }
    if height == 0 {
        return Err(LbmError::parameter("height", "grid height must be positive"));
    }

    Ok((width, height))
}
