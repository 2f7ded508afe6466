//! Unified error types for the rendering pipeline.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are
//! deterministic functions of the input: either the caller supplied an
//! invalid payload or option, or the content exceeds what a QR Model 2
//! symbol can carry.

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Payload failed the pre-encoding validation stage.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Content does not fit into any QR version at the requested
    /// error correction level.
    #[error("content requires {needed} bits but the maximum symbol capacity is {capacity} bits")]
    DataOverCapacity { needed: usize, capacity: usize },

    /// A single segment is too long to be expressed in any QR symbol.
    #[error("content segment too long for any QR symbol")]
    SegmentTooLong,

    /// A color literal could not be parsed.
    #[error("invalid color literal {0:?}")]
    InvalidColor(String),

    /// A gradient descriptor is unusable (e.g. no stops).
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    /// Raster target size is zero or overflows the rasterizer.
    #[error("invalid raster dimension: {0}")]
    InvalidDimension(u32),

    /// Image decoding/encoding error from the underlying codec.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// SVG source could not be parsed for rasterization.
    #[error("SVG rendering error: {0}")]
    Svg(String),
}

/// Error produced by the payload validation stage.
///
/// Required-field presence is checked here, before encoding ever runs, so
/// the encoder can assume a well-formed payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("{kind} payload is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// Latitude outside [-90, 90].
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180].
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
