//! Shader compilation and program linking.

#![allow(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glow::HasContext as _;

use crate::error::{Error, Result};
use crate::handle::{OwnedProgram, OwnedShader};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn gl_const(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    fn file_extension(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Path of the source file for one stage of a named program. GL2-compatible
/// mode selects `*-gl2.*` files (GLSL 1.10, `attribute`/`varying`); the
/// default selects `*-gl3.*` (GLSL 1.30, `in`/`out`).
pub fn shader_path(dir: &Path, base: &str, stage: ShaderStage, gl2_compatible: bool) -> PathBuf {
    let suffix = if gl2_compatible { "gl2" } else { "gl3" };
    dir.join(format!("{base}-{suffix}.{ext}", ext = stage.file_extension()))
}

/// Compile one shader stage, surfacing the driver's compile log on failure.
pub fn compile_shader(
    gl: &Arc<glow::Context>,
    stage: ShaderStage,
    source: &str,
) -> Result<OwnedShader> {
    let shader = OwnedShader::new(gl, stage)?;
    unsafe {
        gl.shader_source(shader.raw(), source);
        gl.compile_shader(shader.raw());
        if !gl.get_shader_compile_status(shader.raw()) {
            return Err(Error::ShaderCompile {
                stage,
                log: gl.get_shader_info_log(shader.raw()),
            });
        }
    }
    Ok(shader)
}

/// Link compiled stages into a program, surfacing the driver's link log on
/// failure. The stages are detached afterwards; the program retains the
/// linked result, so callers are free to drop them.
pub fn link_program(gl: &Arc<glow::Context>, shaders: &[&OwnedShader]) -> Result<OwnedProgram> {
    let program = OwnedProgram::new(gl)?;
    unsafe {
        for shader in shaders {
            gl.attach_shader(program.raw(), shader.raw());
        }
        gl.link_program(program.raw());
        let linked = gl.get_program_link_status(program.raw());
        for shader in shaders {
            gl.detach_shader(program.raw(), shader.raw());
        }
        if !linked {
            return Err(Error::ShaderLink {
                log: gl.get_program_info_log(program.raw()),
            });
        }
    }
    Ok(program)
}

/// A linked vertex + fragment program.
pub struct Program {
    program: OwnedProgram,
}

impl Program {
    /// Compile and link from in-memory source.
    pub fn from_sources(gl: &Arc<glow::Context>, vert_src: &str, frag_src: &str) -> Result<Self> {
        let vert = compile_shader(gl, ShaderStage::Vertex, vert_src)?;
        let frag = compile_shader(gl, ShaderStage::Fragment, frag_src)?;
        let program = link_program(gl, &[&vert, &frag])?;
        // vert/frag stage objects are dropped here; the linked program
        // does not need them anymore.
        Ok(Self { program })
    }

    /// Compile and link from a pair of source files. An unreadable file is
    /// [`Error::ShaderSourceNotFound`], not a compile failure.
    pub fn from_files(gl: &Arc<glow::Context>, vert_path: &Path, frag_path: &Path) -> Result<Self> {
        let vert_src = read_source(vert_path)?;
        let frag_src = read_source(frag_path)?;
        Self::from_sources(gl, &vert_src, &frag_src)
    }

    pub fn raw(&self) -> glow::Program {
        self.program.raw()
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe { gl.use_program(Some(self.raw())) };
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ShaderSourceNotFound {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_path_selects_dialect_suffix() {
        let dir = Path::new("shaders");
        assert_eq!(
            shader_path(dir, "square", ShaderStage::Vertex, false),
            Path::new("shaders/square-gl3.vert")
        );
        assert_eq!(
            shader_path(dir, "square", ShaderStage::Fragment, false),
            Path::new("shaders/square-gl3.frag")
        );
        assert_eq!(
            shader_path(dir, "triangle", ShaderStage::Vertex, true),
            Path::new("shaders/triangle-gl2.vert")
        );
    }

    #[test]
    fn missing_source_file_reports_path() {
        let err = read_source(Path::new("shaders/does-not-exist.vert")).unwrap_err();
        assert!(matches!(err, Error::ShaderSourceNotFound { .. }));
        assert!(err.to_string().contains("does-not-exist.vert"));
    }
}
