/// Error types for boundary loading
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while loading boundary layers.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// Boundary file could not be read
    #[error("Failed to read geometry file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid GeoJSON, or a geometry failed to convert
    #[error("Failed to parse GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    /// Document parsed but is a bare Feature or Geometry
    #[error("Expected a GeoJSON FeatureCollection, found a {0}")]
    NotFeatureCollection(&'static str),

    /// Feature has a null geometry
    #[error("Feature {index} has no geometry")]
    MissingGeometry { index: usize },

    /// Feature geometry is neither Polygon nor MultiPolygon
    #[error("Feature {index} has unsupported geometry type {kind}")]
    UnsupportedGeometry { index: usize, kind: &'static str },

    /// Required label property is absent or empty
    #[error("Feature {index} is missing required property `{key}`")]
    MissingProperty { index: usize, key: String },

    /// Every download attempt failed
    #[cfg(feature = "api")]
    #[error("Fetching {url} failed after {attempts} attempts")]
    FetchFailed { url: String, attempts: u32 },
}

/// Type alias for Results using GeometryError
pub type Result<T> = std::result::Result<T, GeometryError>;
