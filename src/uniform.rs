//! Forgiving uniform/attribute access.
//!
//! Shader compilers may legitimately optimize away a declared uniform or
//! attribute, so failing to resolve a name is a warning, not an error: the
//! resolver returns `None` and every setter below is defined to silently do
//! nothing when handed `None`. This lets call sites set everything
//! unconditionally, at the cost of also swallowing genuine name-mismatch
//! bugs — an intentional leniency, kept as-is.

#![allow(unsafe_code)]

use glow::HasContext as _;

use crate::check_for_gl_error;

/// Resolve a uniform by name, warning (once, at resolve time) if the program
/// does not expose it.
pub fn uniform_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
) -> Option<glow::UniformLocation> {
    let location = unsafe { gl.get_uniform_location(program, name) };
    if location.is_none() {
        log::warn!(
            "uniform {name:?} cannot be bound (it either doesn't exist or has been optimized away); set_uniform calls will silently ignore it"
        );
    }
    location
}

/// Resolve a vertex attribute by name, warning if the program does not
/// expose it.
pub fn attrib_location(gl: &glow::Context, program: glow::Program, name: &str) -> Option<u32> {
    let location = unsafe { gl.get_attrib_location(program, name) };
    if location.is_none() {
        log::warn!(
            "attribute {name:?} cannot be bound (it either doesn't exist or has been optimized away); attribute calls will silently ignore it"
        );
    }
    location
}

pub fn set_uniform_1i(gl: &glow::Context, location: Option<&glow::UniformLocation>, x: i32) {
    if location.is_some() {
        unsafe { gl.uniform_1_i32(location, x) };
        check_for_gl_error!(gl, "uniform_1_i32");
    }
}

pub fn set_uniform_1f(gl: &glow::Context, location: Option<&glow::UniformLocation>, x: f32) {
    if location.is_some() {
        unsafe { gl.uniform_1_f32(location, x) };
        check_for_gl_error!(gl, "uniform_1_f32");
    }
}

pub fn set_uniform_2f(gl: &glow::Context, location: Option<&glow::UniformLocation>, x: f32, y: f32) {
    if location.is_some() {
        unsafe { gl.uniform_2_f32(location, x, y) };
        check_for_gl_error!(gl, "uniform_2_f32");
    }
}

pub fn set_uniform_3f(
    gl: &glow::Context,
    location: Option<&glow::UniformLocation>,
    x: f32,
    y: f32,
    z: f32,
) {
    if location.is_some() {
        unsafe { gl.uniform_3_f32(location, x, y, z) };
        check_for_gl_error!(gl, "uniform_3_f32");
    }
}

/// Describe the currently bound `ARRAY_BUFFER` as a tightly packed float
/// attribute. No-op when the attribute was not found.
pub fn set_attrib_pointer_f32(gl: &glow::Context, location: Option<u32>, vector_size: i32) {
    if let Some(location) = location {
        unsafe { gl.vertex_attrib_pointer_f32(location, vector_size, glow::FLOAT, false, 0, 0) };
        check_for_gl_error!(gl, "vertex_attrib_pointer_f32");
    }
}

pub fn enable_attrib(gl: &glow::Context, location: Option<u32>) {
    if let Some(location) = location {
        unsafe { gl.enable_vertex_attrib_array(location) };
        check_for_gl_error!(gl, "enable_vertex_attrib_array");
    }
}

pub fn disable_attrib(gl: &glow::Context, location: Option<u32>) {
    if let Some(location) = location {
        unsafe { gl.disable_vertex_attrib_array(location) };
        check_for_gl_error!(gl, "disable_vertex_attrib_array");
    }
}
