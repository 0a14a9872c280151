//! Owning wrappers around GL object handles.
//!
//! Each wrapper allocates its object on construction and deletes it exactly
//! once when dropped. The wrappers are movable but not clonable: a clone
//! would delete the same handle twice. The raw glow handle is exposed
//! through an explicit [`raw`](OwnedBuffer::raw) accessor rather than any
//! implicit conversion, so ownership and raw-use sites stay textually
//! distinct.
//!
//! Every wrapper keeps a clone of the [`glow::Context`] `Arc` it was created
//! from, so deletion needs no outside state. All of this is single-threaded:
//! GL objects must only be touched from the thread that owns the context.

#![allow(unsafe_code)]

use std::sync::Arc;

use glow::HasContext as _;

use crate::error::{Error, Result};
use crate::shader::ShaderStage;

fn creation_failed(kind: &'static str, reason: String) -> Error {
    Error::ResourceCreation { kind, reason }
}

/// One compiled (or about-to-be-compiled) shader stage.
pub struct OwnedShader {
    gl: Arc<glow::Context>,
    raw: glow::Shader,
}

impl OwnedShader {
    pub fn new(gl: &Arc<glow::Context>, stage: ShaderStage) -> Result<Self> {
        let raw = unsafe { gl.create_shader(stage.gl_const()) }
            .map_err(|reason| creation_failed("shader", reason))?;
        Ok(Self {
            gl: Arc::clone(gl),
            raw,
        })
    }

    pub fn raw(&self) -> glow::Shader {
        self.raw
    }
}

impl Drop for OwnedShader {
    fn drop(&mut self) {
        unsafe { self.gl.delete_shader(self.raw) };
    }
}

/// A linked (or about-to-be-linked) shader program.
pub struct OwnedProgram {
    gl: Arc<glow::Context>,
    raw: glow::Program,
}

impl OwnedProgram {
    pub fn new(gl: &Arc<glow::Context>) -> Result<Self> {
        let raw = unsafe { gl.create_program() }
            .map_err(|reason| creation_failed("program", reason))?;
        Ok(Self {
            gl: Arc::clone(gl),
            raw,
        })
    }

    pub fn raw(&self) -> glow::Program {
        self.raw
    }
}

impl Drop for OwnedProgram {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.raw) };
    }
}

pub struct OwnedTexture {
    gl: Arc<glow::Context>,
    raw: glow::Texture,
}

impl OwnedTexture {
    pub fn new(gl: &Arc<glow::Context>) -> Result<Self> {
        let raw = unsafe { gl.create_texture() }
            .map_err(|reason| creation_failed("texture", reason))?;
        Ok(Self {
            gl: Arc::clone(gl),
            raw,
        })
    }

    pub fn raw(&self) -> glow::Texture {
        self.raw
    }
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        unsafe { self.gl.delete_texture(self.raw) };
    }
}

pub struct OwnedBuffer {
    gl: Arc<glow::Context>,
    raw: glow::Buffer,
}

impl OwnedBuffer {
    pub fn new(gl: &Arc<glow::Context>) -> Result<Self> {
        let raw = unsafe { gl.create_buffer() }
            .map_err(|reason| creation_failed("buffer", reason))?;
        Ok(Self {
            gl: Arc::clone(gl),
            raw,
        })
    }

    pub fn raw(&self) -> glow::Buffer {
        self.raw
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        unsafe { self.gl.delete_buffer(self.raw) };
    }
}

pub struct OwnedVertexArray {
    gl: Arc<glow::Context>,
    raw: glow::VertexArray,
}

impl OwnedVertexArray {
    pub fn new(gl: &Arc<glow::Context>) -> Result<Self> {
        let raw = unsafe { gl.create_vertex_array() }
            .map_err(|reason| creation_failed("vertex array", reason))?;
        Ok(Self {
            gl: Arc::clone(gl),
            raw,
        })
    }

    pub fn raw(&self) -> glow::VertexArray {
        self.raw
    }
}

impl Drop for OwnedVertexArray {
    fn drop(&mut self) {
        unsafe { self.gl.delete_vertex_array(self.raw) };
    }
}
