//! Crate-wide error taxonomy.
//!
//! Everything here is fatal: these errors are only raised during one-time
//! initialization (or by the strict post-frame GL check), unwind to `main`,
//! get printed, and terminate the process. Missing uniform/attribute names
//! are deliberately NOT an error — see [`crate::uniform`].

use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderStage;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The driver refused to allocate a GL object handle. Usually resource
    /// exhaustion or a dead context.
    #[error("failed to create {kind} object: {reason}")]
    ResourceCreation { kind: &'static str, reason: String },

    /// The shader source file could not be read. Kept separate from
    /// [`Error::ShaderCompile`]: this is a packaging problem, not a shader
    /// authoring bug.
    #[error("failed to read shader source {path:?}: {source}")]
    ShaderSourceNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A shader stage failed to compile. Carries the driver's compile log.
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    /// The program failed to link. Carries the driver's link log.
    #[error("failed to link shader program: {log}")]
    ShaderLink { log: String },

    /// Image file could not be decoded, or had degenerate dimensions.
    #[error("failed to load texture {path:?}: {reason}")]
    TextureLoad { path: PathBuf, reason: String },

    /// A GL error was left pending after a setup phase or a draw.
    #[error("GL error during {context}: {error}")]
    Gl {
        context: &'static str,
        error: &'static str,
    },

    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("OpenGL context error: {0}")]
    Glutin(#[from] glutin::error::Error),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_the_stage() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment"), "{msg}");
        assert!(msg.contains("0:3: syntax error"), "{msg}");
    }

    #[test]
    fn link_error_includes_driver_log() {
        let err = Error::ShaderLink {
            log: "varying vTexCoord not written".to_owned(),
        };
        assert!(err.to_string().contains("varying vTexCoord not written"));
    }

    #[test]
    fn source_not_found_is_distinct_from_compile_failure() {
        let err = Error::ShaderSourceNotFound {
            path: "shaders/square-gl3.vert".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(matches!(err, Error::ShaderSourceNotFound { .. }));
        assert!(err.to_string().contains("square-gl3.vert"));
    }
}
