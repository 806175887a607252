use glow::HasContext;
use image::RgbaImage;
use shared::ViewerOptions;

use super::camera::CameraState;
use super::indicator::OrientationIndicator;
use super::mesh::{self, LineMeshData, MeshData, PrimitiveMode, LINE_STRIDE, MESH_STRIDE};
use crate::asset::SceneAsset;
use crate::capture::{ClearMode, RenderSurface, SceneLayers};
use crate::state::settings::ViewportSettings;

/// Opaque clear color when the environment has no background
const DEFAULT_CLEAR: [u8; 3] = [30, 30, 35];

// ── Offscreen target ─────────────────────────────────────────

/// Square color + depth framebuffer
pub struct RenderTarget {
    fbo: glow::Framebuffer,
    color: glow::Texture,
    depth: glow::Renderbuffer,
    size: u32,
}

impl RenderTarget {
    fn new(gl: &glow::Context, size: u32) -> Result<Self, String> {
        let side = size as i32;
        unsafe {
            let color = gl.create_texture()?;
            gl.bind_texture(glow::TEXTURE_2D, Some(color));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                side,
                side,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);

            let depth = gl.create_renderbuffer()?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, side, side);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            let fbo = gl.create_framebuffer()?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(color),
                0,
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_renderbuffer(depth);
                gl.delete_texture(color);
                return Err(format!("framebuffer incomplete: 0x{status:x}"));
            }

            Ok(Self { fbo, color, depth, size })
        }
    }

    pub fn texture(&self) -> glow::Texture {
        self.color
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    unsafe fn bind(&self, gl: &glow::Context) {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
        gl.viewport(0, 0, self.size as i32, self.size as i32);
    }

    fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_renderbuffer(self.depth);
            gl.delete_texture(self.color);
        }
    }
}

// ── GPU mesh handles ─────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
    mode: PrimitiveMode,
}

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

impl GpuMesh {
    fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_buffer(self.ibo);
        }
    }
}

impl GpuLines {
    fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
        }
    }
}

/// Lighting and post-processing uniforms, refreshed by `update_lights`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Lights {
    ambient: [f32; 3],
    direct: [f32; 3],
    exposure: f32,
    tone_mapping: i32,
}

/// Per-material toggles, refreshed by `update_display`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Display {
    point_size: f32,
    wireframe: bool,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    target: RenderTarget,
    indicator_target: RenderTarget,
    grid: Option<GpuLines>,
    /// Cached grid settings to detect changes
    cached_grid: Option<(i32, f32, f32)>,
    indicator_axes: Option<GpuLines>,
    scene_meshes: Vec<GpuMesh>,
    skeleton: Option<GpuLines>,
    /// Model generation currently uploaded
    scene_generation: u64,
    lights: Lights,
    display: Display,
    layers: SceneLayers,
    clear: ClearMode,
    camera: CameraState,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context, surface_size: u32, indicator_size: u32) -> Result<Self, String> {
        let mesh_program = compile_program(gl, MESH_VERT, MESH_FRAG)?;
        let line_program = compile_program(gl, LINE_VERT, LINE_FRAG)?;
        let target = RenderTarget::new(gl, surface_size.max(1))?;
        let indicator_target = RenderTarget::new(gl, indicator_size.max(1))?;

        let mut renderer = Self {
            mesh_program,
            line_program,
            target,
            indicator_target,
            grid: None,
            cached_grid: None,
            indicator_axes: None,
            scene_meshes: Vec::new(),
            skeleton: None,
            scene_generation: 0,
            lights: Lights {
                ambient: [0.3; 3],
                direct: [2.5; 3],
                exposure: 1.0,
                tone_mapping: 1,
            },
            display: Display {
                point_size: 1.0,
                wireframe: false,
            },
            layers: SceneLayers {
                background: None,
                grid_visible: true,
                helpers_visible: false,
            },
            clear: ClearMode::Opaque,
            camera: CameraState {
                position: glam::Vec3::new(0.0, 2.0, 8.0),
                target: glam::Vec3::ZERO,
                near: 0.01,
                far: 1000.0,
                fov: 45.0_f32.to_radians(),
            },
        };
        renderer.indicator_axes = upload_lines(gl, &mesh::axes(1.0));
        renderer.update_grid(gl, &ViewportSettings::default());
        tracing::info!("GL renderer ready ({surface_size}px surface)");
        Ok(renderer)
    }

    pub fn texture(&self) -> glow::Texture {
        self.target.texture()
    }

    pub fn indicator_texture(&self) -> glow::Texture {
        self.indicator_target.texture()
    }

    pub fn surface_size(&self) -> u32 {
        self.target.size()
    }

    /// Rebuild the grid mesh when its settings change
    pub fn update_grid(&mut self, gl: &glow::Context, settings: &ViewportSettings) {
        let key = (settings.grid_range, settings.grid_cell, settings.grid_opacity);
        if self.cached_grid == Some(key) {
            return;
        }
        if let Some(old) = self.grid.take() {
            old.destroy(gl);
        }
        self.grid = upload_lines(gl, &mesh::grid(key.0, key.1, key.2));
        self.cached_grid = Some(key);
    }

    /// Exposure, tone mapping and light colors/intensities
    pub fn update_lights(&mut self, options: &ViewerOptions) {
        let boost = options.environment.ambient_boost();
        let scale = |c: [u8; 3], k: f32| c.map(|v| v as f32 / 255.0 * k);
        self.lights = Lights {
            ambient: scale(options.ambient_color, options.ambient_intensity + boost),
            direct: scale(options.direct_color, options.direct_intensity),
            exposure: options.exposure,
            tone_mapping: options.tone_mapping.shader_code(),
        };
    }

    /// Point size and wireframe
    pub fn update_display(&mut self, options: &ViewerOptions) {
        self.display = Display {
            point_size: options.point_size.max(1.0),
            wireframe: options.wireframe,
        };
    }

    /// Replace the uploaded model. Old buffers are freed before the new ones
    /// are created.
    pub fn sync_scene(&mut self, gl: &glow::Context, scene: Option<&SceneAsset>, generation: u64) {
        if generation == self.scene_generation {
            return;
        }
        self.release_scene(gl);
        self.scene_generation = generation;

        let Some(asset) = scene else {
            return;
        };
        for data in asset.world_meshes() {
            if let Some(gpu) = upload_mesh(gl, &data) {
                self.scene_meshes.push(gpu);
            }
        }
        let bones = asset.skeleton_lines();
        if bones.vertex_count() > 0 {
            self.skeleton = upload_lines(gl, &bones);
        }
        tracing::debug!(
            "Uploaded generation {generation}: {} meshes",
            self.scene_meshes.len()
        );
    }

    fn release_scene(&mut self, gl: &glow::Context) {
        for mesh in self.scene_meshes.drain(..) {
            mesh.destroy(gl);
        }
        if let Some(bones) = self.skeleton.take() {
            bones.destroy(gl);
        }
    }

    /// Render the scene into the offscreen target
    pub fn paint(&self, gl: &glow::Context) {
        let vp = view_projection(&self.camera);
        let (clear, alpha) = match self.clear {
            ClearMode::Transparent => ([0.0; 3], 0.0),
            ClearMode::Opaque => {
                let bg = self.layers.background.unwrap_or(DEFAULT_CLEAR);
                (bg.map(|v| v as f32 / 255.0), 1.0)
            }
        };

        unsafe {
            self.target.bind(gl);
            gl.disable(glow::SCISSOR_TEST);
            gl.clear_color(clear[0], clear[1], clear[2], alpha);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::BLEND);
            gl.blend_func_separate(
                glow::SRC_ALPHA,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            );

            if self.layers.grid_visible {
                if let Some(grid) = &self.grid {
                    gl.use_program(Some(self.line_program));
                    set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
                    draw_lines(gl, grid);
                }
            }

            gl.use_program(Some(self.mesh_program));
            set_uniform_mat4(gl, self.mesh_program, "u_mvp", &vp);
            let light_dir = glam::Vec3::new(0.5, 1.0, 0.8).normalize();
            set_uniform_vec3(gl, self.mesh_program, "u_light_dir", light_dir.to_array());
            set_uniform_vec3(gl, self.mesh_program, "u_ambient", self.lights.ambient);
            set_uniform_vec3(gl, self.mesh_program, "u_direct", self.lights.direct);
            set_uniform_f32(gl, self.mesh_program, "u_exposure", self.lights.exposure);
            set_uniform_i32(gl, self.mesh_program, "u_tone_mapping", self.lights.tone_mapping);
            set_uniform_f32(gl, self.mesh_program, "u_point_size", self.display.point_size);
            gl.enable(glow::PROGRAM_POINT_SIZE);
            if self.display.wireframe {
                gl.polygon_mode(glow::FRONT_AND_BACK, glow::LINE);
            }
            for mesh in &self.scene_meshes {
                draw_mesh(gl, mesh);
            }
            if self.display.wireframe {
                gl.polygon_mode(glow::FRONT_AND_BACK, glow::FILL);
            }

            if self.layers.helpers_visible {
                if let Some(bones) = &self.skeleton {
                    gl.disable(glow::DEPTH_TEST);
                    gl.use_program(Some(self.line_program));
                    set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
                    draw_lines(gl, bones);
                }
            }

            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.use_program(None);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// Render the orientation indicator into its own small target
    pub fn paint_indicator(&self, gl: &glow::Context, indicator: &OrientationIndicator) {
        let Some(axes) = &self.indicator_axes else {
            return;
        };
        unsafe {
            self.indicator_target.bind(gl);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.use_program(Some(self.line_program));
            set_uniform_mat4(gl, self.line_program, "u_mvp", &indicator.view_projection());
            draw_lines(gl, axes);
            gl.use_program(None);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// Straight-alpha RGBA of the offscreen target, top row first
    pub fn read_pixels(&self, gl: &glow::Context) -> Option<RgbaImage> {
        let size = self.target.size();
        let mut buf = vec![0u8; (size * size * 4) as usize];
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.target.fbo));
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            gl.read_pixels(
                0,
                0,
                size as i32,
                size as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut buf)),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        let mut image = RgbaImage::from_raw(size, size, buf)?;
        image::imageops::flip_vertical_in_place(&mut image);
        Some(image)
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        self.release_scene(gl);
        for lines in [self.grid.take(), self.indicator_axes.take()].into_iter().flatten() {
            lines.destroy(gl);
        }
        self.target.destroy(gl);
        self.indicator_target.destroy(gl);
        unsafe {
            gl.delete_program(self.mesh_program);
            gl.delete_program(self.line_program);
        }
    }
}

/// The renderer paired with a GL context for one frame
pub struct GlSurface<'a> {
    pub gl: &'a glow::Context,
    pub renderer: &'a mut GlRenderer,
}

impl RenderSurface for GlSurface<'_> {
    fn sync_scene(&mut self, scene: Option<&SceneAsset>, generation: u64) {
        self.renderer.sync_scene(self.gl, scene, generation);
    }

    fn apply_options(&mut self, options: &ViewerOptions) {
        self.renderer.update_lights(options);
        self.renderer.update_display(options);
    }

    fn is_ready(&self) -> bool {
        !self.renderer.scene_meshes.is_empty() && self.renderer.target.size() > 0
    }

    fn surface_size(&self) -> (u32, u32) {
        let s = self.renderer.target.size();
        (s, s)
    }

    fn scene_layers(&self) -> SceneLayers {
        self.renderer.layers
    }

    fn set_scene_layers(&mut self, layers: SceneLayers) {
        self.renderer.layers = layers;
    }

    fn clear_mode(&self) -> ClearMode {
        self.renderer.clear
    }

    fn set_clear_mode(&mut self, mode: ClearMode) {
        self.renderer.clear = mode;
    }

    fn camera_state(&self) -> CameraState {
        self.renderer.camera
    }

    fn set_camera_state(&mut self, state: &CameraState) {
        self.renderer.camera = *state;
    }

    fn render_frame(&mut self) {
        self.renderer.paint(self.gl);
    }

    fn read_pixels(&mut self) -> Option<RgbaImage> {
        self.renderer.read_pixels(self.gl)
    }
}

fn view_projection(camera: &CameraState) -> glam::Mat4 {
    let view = glam::Mat4::look_at_rh(camera.position, camera.target, glam::Vec3::Y);
    let proj = glam::Mat4::perspective_rh_gl(camera.fov, 1.0, camera.near, camera.far);
    proj * view
}

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, data: &MeshData) -> Option<GpuMesh> {
    unsafe {
        let vao = gl.create_vertex_array().ok()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().ok()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&data.vertices), glow::STATIC_DRAW);

        let stride = (MESH_STRIDE * 4) as i32;
        // position, normal, color
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, stride, 6 * 4);

        let ibo = gl.create_buffer().ok()?;
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, cast_slice(&data.indices), glow::STATIC_DRAW);

        gl.bind_vertex_array(None);

        Some(GpuMesh {
            vao,
            vbo,
            ibo,
            index_count: data.indices.len() as i32,
            mode: data.mode,
        })
    }
}

fn upload_lines(gl: &glow::Context, data: &LineMeshData) -> Option<GpuLines> {
    unsafe {
        let vao = gl.create_vertex_array().ok()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().ok()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&data.vertices), glow::STATIC_DRAW);

        let stride = (LINE_STRIDE * 4) as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, 3 * 4);

        gl.bind_vertex_array(None);

        Some(GpuLines {
            vao,
            vbo,
            vertex_count: data.vertex_count() as i32,
        })
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    let mode = match mesh.mode {
        PrimitiveMode::Triangles => glow::TRIANGLES,
        PrimitiveMode::Lines => glow::LINES,
        PrimitiveMode::Points => glow::POINTS,
    };
    gl.bind_vertex_array(Some(mesh.vao));
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(mesh.ibo));
    gl.draw_elements(mode, mesh.index_count, glow::UNSIGNED_INT, 0);
    gl.bind_vertex_array(None);
}

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program, String> {
    unsafe {
        let program = gl.create_program()?;
        let mut shaders = Vec::new();
        for (kind, src) in [(glow::VERTEX_SHADER, vert_src), (glow::FRAGMENT_SHADER, frag_src)] {
            let shader = gl.create_shader(kind)?;
            gl.shader_source(shader, src);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                tracing::error!("Shader compile error: {log}");
                return Err(log);
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }
        if !linked {
            let log = gl.get_program_info_log(program);
            tracing::error!("Program link error: {log}");
            return Err(log);
        }
        Ok(program)
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &glam::Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: [f32; 3]) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v[0], v[1], v[2]);
    }
}

fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}

fn set_uniform_i32(gl: &glow::Context, program: glow::Program, name: &str, v: i32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_i32(loc.as_ref(), v);
    }
}

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;
uniform float u_point_size;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

out vec3 v_normal;
out vec3 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    gl_PointSize = u_point_size;
    v_normal = a_normal;
    v_color = a_color;
}
"#;

const MESH_FRAG: &str = r#"#version 330 core
uniform vec3 u_light_dir;
uniform vec3 u_ambient;
uniform vec3 u_direct;
uniform float u_exposure;
uniform int u_tone_mapping;

in vec3 v_normal;
in vec3 v_color;

out vec4 frag_color;

vec3 aces(vec3 x) {
    return clamp((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14), 0.0, 1.0);
}

void main() {
    vec3 n = normalize(v_normal);
    float diffuse = max(dot(n, u_light_dir), 0.0);
    // direct intensity is in physical-ish units, scale into display range
    vec3 light = u_ambient + u_direct * diffuse * 0.4;
    vec3 color = v_color * light * u_exposure;
    if (u_tone_mapping == 1) {
        color = aces(color);
    } else if (u_tone_mapping == 2) {
        color = color / (color + vec3(1.0));
    } else {
        color = clamp(color, 0.0, 1.0);
    }
    frag_color = vec4(color, 1.0);
}
"#;

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;
