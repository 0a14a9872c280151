//! Pixel-map decoding and 2D texture upload.

#![allow(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use glow::HasContext as _;

use crate::check_for_gl_error;
use crate::error::{Error, Result};
use crate::handle::OwnedTexture;

/// Decoded RGB pixels, still on the CPU.
pub struct Pixmap {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode a PPM pixel map (`P6` binary or `P3` ASCII) into tightly packed
/// RGB bytes.
pub fn decode_pixmap(bytes: &[u8]) -> std::result::Result<Pixmap, String> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Pnm)
        .map_err(|err| err.to_string())?;
    let rgb = image.into_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("degenerate dimensions {width}x{height}"));
    }
    Ok(Pixmap {
        pixels: rgb.into_raw(),
        width,
        height,
    })
}

/// One GL texture plus the dimensions it was uploaded with.
pub struct Texture2d {
    texture: OwnedTexture,
    width: u32,
    height: u32,
}

impl Texture2d {
    /// Read and decode `path`, then upload. `srgb` selects a gamma-corrected
    /// internal format (pair it with `FRAMEBUFFER_SRGB`).
    pub fn load(gl: &Arc<glow::Context>, path: &Path, srgb: bool) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| Error::TextureLoad {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        let pixmap = decode_pixmap(&bytes).map_err(|reason| Error::TextureLoad {
            path: path.to_owned(),
            reason,
        })?;
        Self::from_pixmap(gl, &pixmap, srgb)
    }

    /// Upload decoded pixels at mip level 0 with nearest-neighbor filtering
    /// and clamp-to-edge wrapping on both axes.
    pub fn from_pixmap(gl: &Arc<glow::Context>, pixmap: &Pixmap, srgb: bool) -> Result<Self> {
        assert_eq!(
            pixmap.pixels.len(),
            pixmap.width as usize * pixmap.height as usize * 3,
            "pixel buffer size must match dimensions"
        );

        let texture = OwnedTexture::new(gl)?;
        let internal_format = if srgb { glow::SRGB8 } else { glow::RGB8 };
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture.raw()));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format as i32,
                pixmap.width as i32,
                pixmap.height as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&pixmap.pixels)),
            );
            check_for_gl_error!(gl, "tex_image_2d");

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            check_for_gl_error!(gl, "tex_parameter_i32");
        }

        Ok(Self {
            texture,
            width: pixmap.width,
            height: pixmap.height,
        })
    }

    /// Bind to the given texture unit (0 for `TEXTURE0`, and so on).
    pub fn bind(&self, gl: &glow::Context, unit: u32) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture.raw()));
        }
    }

    pub fn raw(&self) -> glow::Texture {
        self.texture.raw()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p6(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = format!("P6\n{width} {height}\n255\n").into_bytes();
        bytes.extend(std::iter::repeat_n(0x7F_u8, (width * height * 3) as usize));
        bytes
    }

    #[test]
    fn decodes_binary_ppm() {
        let pixmap = decode_pixmap(&p6(4, 2)).unwrap();
        assert_eq!((pixmap.width, pixmap.height), (4, 2));
        assert_eq!(pixmap.pixels.len(), 4 * 2 * 3);
    }

    #[test]
    fn decodes_ascii_ppm() {
        let pixmap = decode_pixmap(b"P3\n2 1\n255\n255 0 0  0 0 255\n").unwrap();
        assert_eq!((pixmap.width, pixmap.height), (2, 1));
        assert_eq!(pixmap.pixels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_pixmap(b"not a pixmap at all").is_err());
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(decode_pixmap(b"P6\n0 0\n255\n").is_err());
    }
}
