//! Window, GL context and the per-frame loop.
//!
//! Everything lives in one explicit state struct owned by the driver; there
//! are no globals. Initialization is all-or-nothing: any failure unwinds out
//! of [`run`] and the process exits. The steady-state loop performs no
//! allocation or compilation, so no new fatal error classes arise there
//! beyond the strict post-frame GL check.

#![allow(unsafe_code)]

use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use glow::HasContext as _;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, NotCurrentGlContext as _};
use glutin::display::{GetGlDisplay as _, GlDisplay as _};
use glutin::surface::{GlSurface as _, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::HasWindowHandle as _;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::error::{Error, Result};
use crate::geometry::{AttribLocations, Mesh, square, triangle};
use crate::shader::{Program, ShaderStage, shader_path};
use crate::texture::Texture2d;
use crate::uniform::{attrib_location, set_uniform_1f, set_uniform_1i, uniform_location};
use crate::{check_gl_errors, clear_gl_errors};

/// Startup parameters. There are no command-line flags or environment
/// variables; adjust these in code.
pub struct AppConfig {
    pub title: String,
    /// Logical window size at startup; also the reference size for the
    /// aspect-ratio correction.
    pub initial_size: [u32; 2],
    /// Load `*-gl2.*` shaders (GLSL 1.10) instead of `*-gl3.*` (GLSL 1.30),
    /// and skip the sRGB framebuffer setup.
    pub gl2_compatible: bool,
    pub shader_dir: PathBuf,
    /// Square texture pair, then the triangle texture.
    pub texture_paths: [PathBuf; 3],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Basic 2D".to_owned(),
            initial_size: [512, 512],
            gl2_compatible: false,
            shader_dir: PathBuf::from("shaders"),
            texture_paths: [
                PathBuf::from("assets/checker.ppm"),
                PathBuf::from("assets/gradient.ppm"),
                PathBuf::from("assets/rings.ppm"),
            ],
        }
    }
}

/// Per-axis scale factors that keep geometry undistorted when the window is
/// no longer its initial size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AspectCoefficients {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
}

/// `scale = min(W/W0, H/H0)`; each axis then compensates for its own
/// stretch, so the larger axis letterboxes instead of distorting.
pub fn aspect_coefficients(initial: [f32; 2], current: [f32; 2]) -> AspectCoefficients {
    let scale = (current[0] / initial[0]).min(current[1] / initial[1]);
    AspectCoefficients {
        scale,
        x: initial[0] / current[0] * scale,
        y: initial[1] / current[1] * scale,
    }
}

/// Create the event loop, run until the window closes or initialization
/// fails, and surface the failure if there was one.
pub fn run(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = Basic2dApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub struct Basic2dApp {
    config: AppConfig,
    running: Option<Running>,
    error: Option<Error>,
}

impl Basic2dApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            running: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    // Input is not wired to anything; these exist so the event plumbing has
    // somewhere to grow.
    fn on_key(&mut self, _event: &KeyEvent) {}
    fn on_mouse_button(&mut self, _state: ElementState, _button: MouseButton) {}
    fn on_cursor_moved(&mut self, _position: PhysicalPosition<f64>) {}
}

impl ApplicationHandler for Basic2dApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match Running::new(event_loop, &self.config) {
            Ok(running) => {
                running.glutin.window().request_redraw();
                self.running = Some(running);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => running.resize(size),
            WindowEvent::RedrawRequested => match running.redraw() {
                // Vsync paces the swap, so asking for the next frame right
                // away gives a steady loop.
                Ok(()) => running.glutin.window().request_redraw(),
                Err(err) => self.fail(event_loop, err),
            },
            WindowEvent::KeyboardInput { event, .. } => self.on_key(&event),
            WindowEvent::MouseInput { state, button, .. } => self.on_mouse_button(state, button),
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(position),
            _ => {}
        }
    }
}

/// Everything that exists only while the window does.
///
/// Field order is the release order: the scene's GL objects are deleted
/// first, while the context they belong to is still alive.
struct Running {
    scene: Scene,
    gl: Arc<glow::Context>,
    glutin: GlutinWindowContext,
    initial_size: [f32; 2],
    /// Updated by the resize handler, read by the next frame's coefficient
    /// computation. Same thread, so ordering within one loop iteration is
    /// all that matters.
    current_size: [f32; 2],
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self> {
        let glutin = GlutinWindowContext::new(event_loop, config)?;
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                let s = CString::new(s)
                    .expect("failed to construct C string from string for gl proc address");
                glutin.get_proc_address(&s)
            })
        };
        let gl = Arc::new(gl);

        // Context creation can leave stale errors behind; start clean.
        clear_gl_errors(&gl);
        init_gl_state(&gl, config);
        check_gl_errors(&gl, "initial GL state")?;

        let scene = Scene::load(&gl, config)?;

        let size = glutin.window().inner_size();
        let initial_size = [size.width as f32, size.height as f32];
        Ok(Self {
            scene,
            gl,
            glutin,
            initial_size,
            current_size: initial_size,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.glutin.resize(size);
        unsafe { self.gl.viewport(0, 0, size.width as i32, size.height as i32) };
        self.current_size = [size.width as f32, size.height as f32];
    }

    fn redraw(&mut self) -> Result<()> {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) };

        let aspect = aspect_coefficients(self.initial_size, self.current_size);
        self.scene.draw_square(&self.gl, &aspect)?;
        self.scene.draw_triangle(&self.gl, &aspect)?;

        self.glutin.swap_buffers()?;
        check_gl_errors(&self.gl, "frame")
    }
}

fn init_gl_state(gl: &glow::Context, config: &AppConfig) {
    unsafe {
        gl.clear_color(128.0 / 255.0, 200.0 / 255.0, 1.0, 0.0);
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        if !config.gl2_compatible {
            // Textures use sRGB internal formats; convert back on write.
            gl.enable(glow::FRAMEBUFFER_SRGB);
        }
    }
}

// ----------------------------------------------------------------------------

struct SquareProgram {
    program: Program,
    u_vertex_scale: Option<glow::UniformLocation>,
    u_tex0: Option<glow::UniformLocation>,
    u_tex1: Option<glow::UniformLocation>,
    u_x_coefficient: Option<glow::UniformLocation>,
    u_y_coefficient: Option<glow::UniformLocation>,
    attribs: AttribLocations,
}

impl SquareProgram {
    fn load(gl: &Arc<glow::Context>, config: &AppConfig) -> Result<Self> {
        let program = Program::from_files(
            gl,
            &shader_path(
                &config.shader_dir,
                "square",
                ShaderStage::Vertex,
                config.gl2_compatible,
            ),
            &shader_path(
                &config.shader_dir,
                "square",
                ShaderStage::Fragment,
                config.gl2_compatible,
            ),
        )?;
        if !config.gl2_compatible {
            unsafe { gl.bind_frag_data_location(program.raw(), 0, "fragColor") };
        }
        let raw = program.raw();
        let slf = Self {
            u_vertex_scale: uniform_location(gl, raw, "uVertexScale"),
            u_tex0: uniform_location(gl, raw, "uTex0"),
            u_tex1: uniform_location(gl, raw, "uTex1"),
            u_x_coefficient: uniform_location(gl, raw, "uXCoefficient"),
            u_y_coefficient: uniform_location(gl, raw, "uYCoefficient"),
            attribs: AttribLocations {
                position: attrib_location(gl, raw, "aPosition"),
                tex_coord: attrib_location(gl, raw, "aTexCoord"),
                color: None,
            },
            program,
        };
        check_gl_errors(gl, "square program setup")?;
        Ok(slf)
    }
}

struct TriangleProgram {
    program: Program,
    u_tex2: Option<glow::UniformLocation>,
    u_x_coefficient: Option<glow::UniformLocation>,
    u_y_coefficient: Option<glow::UniformLocation>,
    u_x_offset: Option<glow::UniformLocation>,
    u_y_offset: Option<glow::UniformLocation>,
    attribs: AttribLocations,
}

impl TriangleProgram {
    fn load(gl: &Arc<glow::Context>, config: &AppConfig) -> Result<Self> {
        let program = Program::from_files(
            gl,
            &shader_path(
                &config.shader_dir,
                "triangle",
                ShaderStage::Vertex,
                config.gl2_compatible,
            ),
            &shader_path(
                &config.shader_dir,
                "triangle",
                ShaderStage::Fragment,
                config.gl2_compatible,
            ),
        )?;
        if !config.gl2_compatible {
            unsafe { gl.bind_frag_data_location(program.raw(), 0, "fragColor") };
        }
        let raw = program.raw();
        let slf = Self {
            u_tex2: uniform_location(gl, raw, "uTex2"),
            u_x_coefficient: uniform_location(gl, raw, "uXCoefficient"),
            u_y_coefficient: uniform_location(gl, raw, "uYCoefficient"),
            u_x_offset: uniform_location(gl, raw, "uXOffset"),
            u_y_offset: uniform_location(gl, raw, "uYOffset"),
            attribs: AttribLocations {
                position: attrib_location(gl, raw, "aPosition"),
                tex_coord: attrib_location(gl, raw, "aTexCoord"),
                color: attrib_location(gl, raw, "aColor"),
            },
            program,
        };
        check_gl_errors(gl, "triangle program setup")?;
        Ok(slf)
    }
}

/// The two programs, two meshes and three textures, all created during
/// initialization and immutable afterwards.
struct Scene {
    square_program: SquareProgram,
    triangle_program: TriangleProgram,
    square: Mesh,
    triangle: Mesh,
    square_textures: [Texture2d; 2],
    triangle_texture: Texture2d,
    vertex_scale: f32,
    triangle_offset: [f32; 2],
}

impl Scene {
    fn load(gl: &Arc<glow::Context>, config: &AppConfig) -> Result<Self> {
        let square_program = SquareProgram::load(gl, config)?;
        let triangle_program = TriangleProgram::load(gl, config)?;

        let square = Mesh::upload(gl, &square())?;
        let triangle = Mesh::upload(gl, &triangle())?;
        check_gl_errors(gl, "geometry upload")?;

        let srgb = !config.gl2_compatible;
        let [tex0_path, tex1_path, tex2_path] = &config.texture_paths;
        let square_textures = [
            Texture2d::load(gl, tex0_path, srgb)?,
            Texture2d::load(gl, tex1_path, srgb)?,
        ];
        let triangle_texture = Texture2d::load(gl, tex2_path, srgb)?;
        check_gl_errors(gl, "texture upload")?;

        Ok(Self {
            square_program,
            triangle_program,
            square,
            triangle,
            square_textures,
            triangle_texture,
            vertex_scale: 1.0,
            triangle_offset: [0.0, 0.0],
        })
    }

    fn draw_square(&self, gl: &glow::Context, aspect: &AspectCoefficients) -> Result<()> {
        let p = &self.square_program;
        p.program.bind(gl);

        self.square_textures[0].bind(gl, 0);
        self.square_textures[1].bind(gl, 1);
        set_uniform_1i(gl, p.u_tex0.as_ref(), 0);
        set_uniform_1i(gl, p.u_tex1.as_ref(), 1);

        set_uniform_1f(gl, p.u_vertex_scale.as_ref(), self.vertex_scale);
        set_uniform_1f(gl, p.u_x_coefficient.as_ref(), aspect.x);
        set_uniform_1f(gl, p.u_y_coefficient.as_ref(), aspect.y);

        self.square.draw(gl, &p.attribs);
        check_gl_errors(gl, "draw square")
    }

    fn draw_triangle(&self, gl: &glow::Context, aspect: &AspectCoefficients) -> Result<()> {
        let p = &self.triangle_program;
        p.program.bind(gl);

        self.triangle_texture.bind(gl, 2);
        set_uniform_1i(gl, p.u_tex2.as_ref(), 2);

        set_uniform_1f(gl, p.u_x_coefficient.as_ref(), aspect.x);
        set_uniform_1f(gl, p.u_y_coefficient.as_ref(), aspect.y);
        set_uniform_1f(gl, p.u_x_offset.as_ref(), self.triangle_offset[0]);
        set_uniform_1f(gl, p.u_y_offset.as_ref(), self.triangle_offset[1]);

        self.triangle.draw(gl, &p.attribs);
        check_gl_errors(gl, "draw triangle")
    }
}

// ----------------------------------------------------------------------------

/// Window + GL display/context/surface, created together.
struct GlutinWindowContext {
    window: Window,
    gl_context: glutin::context::PossiblyCurrentContext,
    gl_display: glutin::display::Display,
    gl_surface: glutin::surface::Surface<WindowSurface>,
}

impl GlutinWindowContext {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self> {
        let window_attributes = Window::default_attributes()
            .with_title(&config.title)
            .with_resizable(true)
            .with_inner_size(LogicalSize::new(
                config.initial_size[0] as f64,
                config.initial_size[1] as f64,
            ));

        let config_template_builder = ConfigTemplateBuilder::new()
            .prefer_hardware_accelerated(None)
            .with_depth_size(0)
            .with_stencil_size(0)
            .with_transparency(false);

        log::debug!("trying to create glutin Display with config: {config_template_builder:?}");

        let display_builder = glutin_winit::DisplayBuilder::new()
            .with_preference(glutin_winit::ApiPreference::FallbackEgl)
            .with_window_attributes(Some(window_attributes.clone()));

        let (window, gl_config) = display_builder
            .build(event_loop, config_template_builder, |mut config_iterator| {
                let config = config_iterator
                    .next()
                    .expect("failed to find a matching configuration for creating glutin config");
                log::debug!("using the first config from config picker closure. config: {config:?}");
                config
            })
            .map_err(|err| Error::WindowCreation(err.to_string()))?;

        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, window_attributes, &gl_config)
                .map_err(|err| Error::WindowCreation(err.to_string()))?,
        };

        let gl_display = gl_config.display();
        log::debug!(
            "successfully created GL Display with version: {} and supported features: {:?}",
            gl_display.version_string(),
            gl_display.supported_features()
        );

        let raw_window_handle = window
            .window_handle()
            .map_err(|err| Error::WindowCreation(err.to_string()))?
            .as_raw();

        // If a core context cannot be created, try a GLES context as fallback.
        let context_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
        let fallback_context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(None))
            .build(Some(raw_window_handle));

        let not_current_gl_context =
            match unsafe { gl_display.create_context(&gl_config, &context_attributes) } {
                Ok(context) => context,
                Err(err) => {
                    log::warn!(
                        "failed to create context with default attributes: {err}; retrying with GLES"
                    );
                    unsafe {
                        gl_display.create_context(&gl_config, &fallback_context_attributes)?
                    }
                }
            };

        let (width, height): (u32, u32) = window.inner_size().into();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
        );
        let gl_surface =
            unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };

        let gl_context = not_current_gl_context.make_current(&gl_surface)?;

        if let Err(err) =
            gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            log::warn!("failed to set swap interval: {err}");
        }

        Ok(Self {
            window,
            gl_context,
            gl_display,
            gl_surface,
        })
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn resize(&self, physical_size: PhysicalSize<u32>) {
        self.gl_surface.resize(
            &self.gl_context,
            NonZeroU32::new(physical_size.width).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(physical_size.height).unwrap_or(NonZeroU32::MIN),
        );
    }

    fn swap_buffers(&self) -> Result<()> {
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .map_err(Error::from)
    }

    fn get_proc_address(&self, addr: &std::ffi::CStr) -> *const std::ffi::c_void {
        self.gl_display.get_proc_address(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_coefficients_identity_at_initial_size() {
        let aspect = aspect_coefficients([512.0, 512.0], [512.0, 512.0]);
        assert_eq!(
            aspect,
            AspectCoefficients {
                scale: 1.0,
                x: 1.0,
                y: 1.0
            }
        );
    }

    #[test]
    fn aspect_coefficients_double_width() {
        let aspect = aspect_coefficients([512.0, 512.0], [1024.0, 512.0]);
        assert_eq!(aspect.scale, 1.0);
        assert_eq!(aspect.x, 0.5);
        assert_eq!(aspect.y, 1.0);
    }

    #[test]
    fn aspect_coefficients_half_width() {
        let aspect = aspect_coefficients([512.0, 512.0], [256.0, 512.0]);
        assert_eq!(aspect.scale, 0.5);
        assert_eq!(aspect.x, 1.0);
        assert_eq!(aspect.y, 0.5);
    }

    #[test]
    fn default_config_uses_new_shader_interface() {
        let config = AppConfig::default();
        assert!(!config.gl2_compatible);
        assert_eq!(config.initial_size, [512, 512]);
    }
}
