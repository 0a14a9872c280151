//! Fixed geometry and its one-time upload into GL buffers.

#![allow(unsafe_code)]

use std::sync::Arc;

use glow::HasContext as _;

use crate::check_for_gl_error;
use crate::error::Result;
use crate::handle::{OwnedBuffer, OwnedVertexArray};
use crate::uniform::{disable_attrib, enable_attrib, set_attrib_pointer_f32};

/// Borrowed vertex data in a fixed layout: 2-component positions,
/// 2-component texture coordinates, optional 3-component colors, `u32`
/// triangle indices.
#[derive(Copy, Clone, Debug)]
pub struct MeshData<'a> {
    pub positions: &'a [f32],
    pub texcoords: &'a [f32],
    pub colors: Option<&'a [f32]>,
    pub indices: &'a [u32],
}

impl MeshData<'_> {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    /// Panics if the arrays disagree about the vertex count or an index is
    /// out of bounds. The data is compile-time constant, so a violation is a
    /// programming error, not a runtime condition.
    pub fn validate(&self) {
        assert!(self.positions.len() % 2 == 0, "positions must be 2-component");
        assert_eq!(
            self.texcoords.len(),
            self.positions.len(),
            "one texcoord pair per position pair"
        );
        if let Some(colors) = self.colors {
            assert_eq!(colors.len(), 3 * self.vertex_count(), "colors must be 3-component");
        }
        let vertex_count = self.vertex_count() as u32;
        assert!(
            self.indices.iter().all(|&i| i < vertex_count),
            "index out of bounds"
        );
    }
}

/// The unit-ish square, centered on the origin, with the full texture mapped
/// across it.
pub fn square() -> MeshData<'static> {
    MeshData {
        positions: &[
            -0.5, -0.5, //
            0.5, 0.5, //
            0.5, -0.5, //
            -0.5, 0.5,
        ],
        texcoords: &[
            0.0, 0.0, //
            1.0, 1.0, //
            1.0, 0.0, //
            0.0, 1.0,
        ],
        colors: None,
        indices: &[0, 2, 1, 0, 1, 3],
    }
}

/// A triangle with one color per corner. The texture coordinates overshoot
/// [0, 1] so the clamped texture sits centered inside the triangle.
pub fn triangle() -> MeshData<'static> {
    MeshData {
        positions: &[
            0.0, -0.45, //
            -0.45, 0.45, //
            0.45, 0.45,
        ],
        texcoords: &[
            0.5, -0.60, //
            -0.35, 1.1, //
            1.35, 1.1,
        ],
        colors: Some(&[
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ]),
        indices: &[0, 2, 1],
    }
}

/// Per-program attribute locations a [`Mesh`] binds its buffers to.
/// `None` entries are skipped (see [`crate::uniform`]).
#[derive(Copy, Clone, Debug, Default)]
pub struct AttribLocations {
    pub position: Option<u32>,
    pub tex_coord: Option<u32>,
    pub color: Option<u32>,
}

/// One GL buffer per vertex array plus the vertex-array object. Uploaded
/// once with `STATIC_DRAW` and treated as immutable afterwards.
pub struct Mesh {
    vao: OwnedVertexArray,
    positions: OwnedBuffer,
    texcoords: OwnedBuffer,
    colors: Option<OwnedBuffer>,
    indices: OwnedBuffer,
    index_count: i32,
}

impl Mesh {
    pub fn upload(gl: &Arc<glow::Context>, data: &MeshData<'_>) -> Result<Self> {
        data.validate();

        let vao = OwnedVertexArray::new(gl)?;
        let positions = OwnedBuffer::new(gl)?;
        let texcoords = OwnedBuffer::new(gl)?;
        let colors = match data.colors {
            Some(_) => Some(OwnedBuffer::new(gl)?),
            None => None,
        };
        let indices = OwnedBuffer::new(gl)?;

        unsafe {
            gl.bind_vertex_array(Some(vao.raw()));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(positions.raw()));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data.positions),
                glow::STATIC_DRAW,
            );
            check_for_gl_error!(gl, "position upload");

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(texcoords.raw()));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data.texcoords),
                glow::STATIC_DRAW,
            );
            check_for_gl_error!(gl, "texcoord upload");

            if let (Some(buffer), Some(color_data)) = (&colors, data.colors) {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer.raw()));
                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(color_data),
                    glow::STATIC_DRAW,
                );
                check_for_gl_error!(gl, "color upload");
            }

            // The element buffer binding is recorded in the VAO.
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices.raw()));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data.indices),
                glow::STATIC_DRAW,
            );
            check_for_gl_error!(gl, "index upload");

            gl.bind_vertex_array(None);
        }

        Ok(Self {
            vao,
            positions,
            texcoords,
            colors,
            indices,
            index_count: data.indices.len() as i32,
        })
    }

    /// Bind the VAO, point each attribute at its buffer, draw, and disable
    /// the attributes again. Attributes the program does not expose are
    /// skipped.
    pub fn draw(&self, gl: &glow::Context, attrs: &AttribLocations) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao.raw()));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.positions.raw()));
            set_attrib_pointer_f32(gl, attrs.position, 2);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.texcoords.raw()));
            set_attrib_pointer_f32(gl, attrs.tex_coord, 2);

            if let Some(colors) = &self.colors {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(colors.raw()));
                set_attrib_pointer_f32(gl, attrs.color, 3);
            }

            enable_attrib(gl, attrs.position);
            enable_attrib(gl, attrs.tex_coord);
            enable_attrib(gl, attrs.color);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.indices.raw()));
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);

            disable_attrib(gl, attrs.position);
            disable_attrib(gl, attrs.tex_coord);
            disable_attrib(gl, attrs.color);

            gl.bind_vertex_array(None);
        }
    }

    pub fn index_count(&self) -> i32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_layout() {
        let square = square();
        square.validate();
        assert_eq!(square.vertex_count(), 4);
        assert_eq!(square.indices.len(), 6);
        assert!(square.colors.is_none());
    }

    #[test]
    fn triangle_layout() {
        let triangle = triangle();
        triangle.validate();
        assert_eq!(triangle.vertex_count(), 3);
        assert_eq!(triangle.indices.len(), 3);
        assert_eq!(triangle.colors.unwrap().len(), 9);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn validate_rejects_out_of_bounds_index() {
        MeshData {
            positions: &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texcoords: &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            colors: None,
            indices: &[0, 1, 3],
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "one texcoord pair per position pair")]
    fn validate_rejects_mismatched_texcoords() {
        MeshData {
            positions: &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texcoords: &[0.0, 0.0],
            colors: None,
            indices: &[0, 1, 2],
        }
        .validate();
    }
}
