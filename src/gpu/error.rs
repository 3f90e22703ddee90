use thiserror::Error;

use super::device::{ShaderStage, UniformKind};

/// Errors surfaced by [`GpuProgram`](super::GpuProgram) and the devices.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No graphics context could be created for the target surface.
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    ProgramLink { log: String },

    /// A value was sent to a uniform declared with a different type.
    #[error("uniform `{name}` is declared as {expected}, got {actual}")]
    UniformKindMismatch {
        name: String,
        expected: UniformKind,
        actual: UniformKind,
    },
}

pub type GpuResult<T> = Result<T, GpuError>;
