#[derive(Debug, thiserror::Error)]
pub enum ReadbackError {
    #[error("destination buffer length mismatch (expected {expected}, actual {actual})")]
    BufferLength { expected: usize, actual: usize },
    #[error("gpu readback map failed: {0}")]
    MapFailed(String),
    #[error("gpu device error: {0}")]
    Device(String),
}
