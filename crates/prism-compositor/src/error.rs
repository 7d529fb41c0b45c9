use thiserror::Error;

use crate::context::GpuIndex;

/// Failures reported by the context registry and the frame entry points.
///
/// Misuse variants leave every binding and registry entry untouched.
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("GPU index 0 is reserved for the primary context")]
    InvalidGpuIndex,

    #[error("no rendering device supplied for the GPU context")]
    MissingDevice,

    #[error("GPU context {0} is not registered")]
    UnknownContext(GpuIndex),

    /// Device-layer failure, propagated unchanged.
    #[error(transparent)]
    Device(#[from] anyhow::Error),
}

pub type Result<T, E = CompositorError> = std::result::Result<T, E>;
