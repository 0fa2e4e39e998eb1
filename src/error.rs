use std::path::PathBuf;

/// Rejected evolution settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("population size {population_size} must exceed twice the reproduction count ({num_reproductions})")]
    PopulationTooSmall {
        population_size: usize,
        num_reproductions: usize,
    },

    #[error("polygon size bounds are invalid: min {min}, max {max} (need 1 <= min <= max)")]
    PolygonSizeRange { min: usize, max: usize },

    #[error("update interval must be at least 1 generation")]
    ZeroUpdateInterval,

    #[error("target canvas is empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("target buffer is {actual} bytes, expected {expected} for the canvas")]
    TargetSizeMismatch { expected: usize, actual: usize },
}

/// Errors surfaced while setting up an evolution run.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load target image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read settings file {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}
