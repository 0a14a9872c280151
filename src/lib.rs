//! A minimal 2D OpenGL playground built on [`glow`](https://github.com/grovesNL/glow).
//!
//! One resizable window, two shader programs, two fixed meshes (a textured
//! square and a colored triangle), three textures, redrawn every frame with
//! aspect-ratio correction on resize. There is no scene graph and no input
//! handling; the interesting parts are the owning wrappers around GL object
//! handles ([`handle`]), the shader compile/link utilities ([`shader`]) and
//! the forgiving uniform/attribute accessors ([`uniform`]).
//!
//! Run with `RUST_LOG=debug` for GL context-creation chatter.

#![allow(unsafe_code)]

pub mod app;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod shader;
pub mod texture;
pub mod uniform;

pub use error::{Error, Result};

/// Check for an OpenGL error and report it using `log::error`.
///
/// Only active in debug builds!
///
/// ``` no_run
/// # let gl: glow::Context = todo!();
/// use basic2d::check_for_gl_error;
/// check_for_gl_error!(&gl);
/// check_for_gl_error!(&gl, "buffer upload");
/// ```
#[macro_export]
macro_rules! check_for_gl_error {
    ($gl: expr) => {{
        if cfg!(debug_assertions) {
            $crate::check_for_gl_error_impl($gl, file!(), line!(), "")
        }
    }};
    ($gl: expr, $context: literal) => {{
        if cfg!(debug_assertions) {
            $crate::check_for_gl_error_impl($gl, file!(), line!(), $context)
        }
    }};
}

#[doc(hidden)]
pub fn check_for_gl_error_impl(gl: &glow::Context, file: &str, line: u32, context: &str) {
    use glow::HasContext as _;
    let error_code = unsafe { gl.get_error() };
    if error_code != glow::NO_ERROR {
        let error_str = gl_error_name(error_code);
        if context.is_empty() {
            log::error!("GL error, at {file}:{line}: {error_str} (0x{error_code:X})");
        } else {
            log::error!("GL error, at {file}:{line} ({context}): {error_str} (0x{error_code:X})");
        }
    }
}

/// Drain any stale GL error state so that a later check reports only errors
/// raised by the operation it follows.
pub fn clear_gl_errors(gl: &glow::Context) {
    use glow::HasContext as _;
    while unsafe { gl.get_error() } != glow::NO_ERROR {}
}

/// Strict post-phase check: fails with [`Error::Gl`] if any GL error was left
/// pending. Unlike [`check_for_gl_error!`] this is not diagnostic — callers
/// propagate the error and abort. Used after each setup phase and each draw.
pub fn check_gl_errors(gl: &glow::Context, context: &'static str) -> Result<()> {
    use glow::HasContext as _;
    let error_code = unsafe { gl.get_error() };
    if error_code == glow::NO_ERROR {
        Ok(())
    } else {
        // Drain the rest so the next check starts clean; report the first.
        clear_gl_errors(gl);
        Err(Error::Gl {
            context,
            error: gl_error_name(error_code),
        })
    }
}

pub(crate) fn gl_error_name(error_code: u32) -> &'static str {
    match error_code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "<unknown>",
    }
}

#[cfg(test)]
mod tests {
    use super::gl_error_name;

    #[test]
    fn error_names() {
        assert_eq!(gl_error_name(glow::INVALID_ENUM), "GL_INVALID_ENUM");
        assert_eq!(gl_error_name(glow::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
        assert_eq!(gl_error_name(0xDEAD), "<unknown>");
    }
}
