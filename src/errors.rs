use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq)]
pub enum IntegrationError
{
    #[error("function has {found} parameters, integrator requires {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("integral did not converge after {iterations} iterations: estimated error {error_percent} % (allowed {max_error} %) at {npoints} grid points")]
    NonConvergence { iterations: usize, error_percent: f64, max_error: f64, npoints: usize },
    #[error("no function value stored for grid position {0:?}")]
    ValueNotSet(Vec<usize>),
    #[error("invalid integration domain [{min}, {max}] on axis {dim}")]
    InvalidDomain { dim: usize, min: f64, max: f64 },
    #[error("number of points {0} is not of the form 2^n + 1")]
    InvalidPointCount(usize),
    #[error("grid density can only increase (axis {dim}: {current} -> {requested} points)")]
    DensityDecrease { dim: usize, current: usize, requested: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("file i/o failed")]
    FileIOError,
    #[error("serialization failed")]
    SerializationFailed,
    #[error("deserialization failed")]
    DeserializationFailed,
    #[error("lz4 decompression failed")]
    LZ4DecompressionFailed,
    #[error("failed to read buffer")]
    ReadBufferFailed,
    #[error("failed to write buffer")]
    WriteBufferFailed,
}
