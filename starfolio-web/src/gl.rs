//! WebGL2 scene renderer.

use std::collections::HashMap;

use log::error;
use starfolio_core::geometry::INTERLEAVED_STRIDE;
use starfolio_core::{Camera, Light, Rgb, Scene, SceneRenderer, Shape, TextureId};
use wasm_bindgen::JsValue;
use web_sys::{
    HtmlImageElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

const MESH_VERT: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec2 a_uv;
uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;
out vec3 v_world;
out vec3 v_normal;
out vec2 v_uv;
void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world = world.xyz;
    v_normal = mat3(u_model) * a_normal;
    v_uv = a_uv;
    gl_Position = u_projection * u_view * world;
}
"#;

// Normal maps are applied without tangents by rebuilding the surface frame
// from screen-space derivatives.
const MESH_FRAG: &str = r#"#version 300 es
precision highp float;
in vec3 v_world;
in vec3 v_normal;
in vec2 v_uv;
uniform vec3 u_color;
uniform bool u_lit;
uniform bool u_use_map;
uniform sampler2D u_map;
uniform bool u_use_normal_map;
uniform sampler2D u_normal_map;
uniform vec3 u_ambient;
uniform vec3 u_point_color;
uniform vec3 u_point_position;
out vec4 out_color;

vec3 perturb_normal(vec3 n) {
    vec3 q0 = dFdx(v_world);
    vec3 q1 = dFdy(v_world);
    vec2 st0 = dFdx(v_uv);
    vec2 st1 = dFdy(v_uv);
    vec3 map_n = texture(u_normal_map, v_uv).xyz * 2.0 - 1.0;
    vec3 q1perp = cross(q1, n);
    vec3 q0perp = cross(n, q0);
    vec3 t = q1perp * st0.x + q0perp * st1.x;
    vec3 b = q1perp * st0.y + q0perp * st1.y;
    float det = max(dot(t, t), dot(b, b));
    float scale = det == 0.0 ? 0.0 : inversesqrt(det);
    return normalize(t * (map_n.x * scale) + b * (map_n.y * scale) + n * map_n.z);
}

void main() {
    vec3 base = u_color;
    if (u_use_map) {
        base *= texture(u_map, v_uv).rgb;
    }
    if (!u_lit) {
        out_color = vec4(base, 1.0);
        return;
    }
    vec3 n = normalize(v_normal);
    if (u_use_normal_map) {
        n = perturb_normal(n);
    }
    vec3 l = normalize(u_point_position - v_world);
    vec3 light = u_ambient + u_point_color * max(dot(n, l), 0.0);
    out_color = vec4(base * light, 1.0);
}
"#;

// Single oversized triangle covering the viewport
const BACKGROUND_VERT: &str = r#"#version 300 es
out vec2 v_uv;
void main() {
    vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2));
    v_uv = p;
    gl_Position = vec4(p * 2.0 - 1.0, 0.0, 1.0);
}
"#;

const BACKGROUND_FRAG: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D u_background;
out vec4 out_color;
void main() {
    out_color = texture(u_background, v_uv);
}
"#;

fn compile_shader(gl: &GL, src: &str, shader_type: u32) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(shader_type)
        .ok_or("could not create shader")?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    if !gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        return Err(JsValue::from(gl.get_shader_info_log(&shader).unwrap_or_default()));
    }
    Ok(shader)
}

fn link_program(gl: &GL, vert_src: &str, frag_src: &str) -> Result<WebGlProgram, JsValue> {
    let vert = compile_shader(gl, vert_src, GL::VERTEX_SHADER)?;
    let frag = compile_shader(gl, frag_src, GL::FRAGMENT_SHADER)?;
    let prog = gl.create_program().ok_or("could not create program")?;
    gl.attach_shader(&prog, &vert);
    gl.attach_shader(&prog, &frag);
    gl.link_program(&prog);
    if !gl
        .get_program_parameter(&prog, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        return Err(JsValue::from(
            gl.get_program_info_log(&prog).unwrap_or_default(),
        ));
    }
    Ok(prog)
}

struct MeshBuffers {
    vao: WebGlVertexArrayObject,
    // Held so the vertex data outlives the VAO that references it
    _vbo: WebGlBuffer,
    vertex_count: i32,
}

struct MeshUniforms {
    model: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    lit: Option<WebGlUniformLocation>,
    use_map: Option<WebGlUniformLocation>,
    map: Option<WebGlUniformLocation>,
    use_normal_map: Option<WebGlUniformLocation>,
    normal_map: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    point_color: Option<WebGlUniformLocation>,
    point_position: Option<WebGlUniformLocation>,
}

impl MeshUniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            model: at("u_model"),
            view: at("u_view"),
            projection: at("u_projection"),
            color: at("u_color"),
            lit: at("u_lit"),
            use_map: at("u_use_map"),
            map: at("u_map"),
            use_normal_map: at("u_use_normal_map"),
            normal_map: at("u_normal_map"),
            ambient: at("u_ambient"),
            point_color: at("u_point_color"),
            point_position: at("u_point_position"),
        }
    }
}

/// Draws a [`Scene`] into a WebGL2 context
pub struct GlRenderer {
    gl: GL,
    mesh_program: WebGlProgram,
    uniforms: MeshUniforms,
    background_program: WebGlProgram,
    background_sampler: Option<WebGlUniformLocation>,
    meshes: Vec<(Shape, MeshBuffers)>,
    textures: HashMap<TextureId, WebGlTexture>,
}

impl GlRenderer {
    pub fn new(gl: GL) -> Result<Self, JsValue> {
        let mesh_program = link_program(&gl, MESH_VERT, MESH_FRAG)?;
        let uniforms = MeshUniforms::locate(&gl, &mesh_program);
        let background_program = link_program(&gl, BACKGROUND_VERT, BACKGROUND_FRAG)?;
        let background_sampler = gl.get_uniform_location(&background_program, "u_background");

        gl.enable(GL::DEPTH_TEST);
        gl.enable(GL::CULL_FACE);
        gl.cull_face(GL::BACK);
        gl.clear_color(0.0, 0.0, 0.0, 1.0);

        Ok(Self {
            gl,
            mesh_program,
            uniforms,
            background_program,
            background_sampler,
            meshes: Vec::new(),
            textures: HashMap::new(),
        })
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    /// Upload every distinct shape in the scene ahead of the first frame
    pub fn prepare(&mut self, scene: &Scene) -> Result<(), JsValue> {
        for object in scene.objects() {
            self.buffers_for(&object.shape)?;
        }
        Ok(())
    }

    fn buffers_for(&mut self, shape: &Shape) -> Result<usize, JsValue> {
        if let Some(index) = self.meshes.iter().position(|(s, _)| s == shape) {
            return Ok(index);
        }

        let gl = &self.gl;
        let mesh = shape.tessellate();
        let data = mesh.interleaved();

        let vao = gl.create_vertex_array().ok_or("could not create vertex array")?;
        let vbo = gl.create_buffer().ok_or("could not create buffer")?;
        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&vbo));
        let array = js_sys::Float32Array::from(data.as_slice());
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::STATIC_DRAW);

        let stride = (INTERLEAVED_STRIDE * std::mem::size_of::<f32>()) as i32;
        for (location, size, offset) in [(0u32, 3, 0), (1, 3, 3), (2, 2, 6)] {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(
                location,
                size,
                GL::FLOAT,
                false,
                stride,
                offset * std::mem::size_of::<f32>() as i32,
            );
        }
        gl.bind_vertex_array(None);

        self.meshes.push((
            *shape,
            MeshBuffers {
                vao,
                _vbo: vbo,
                vertex_count: mesh.vertex_count() as i32,
            },
        ));
        Ok(self.meshes.len() - 1)
    }

    /// Upload a decoded image for a texture slot; returns its size
    pub fn upload_texture(&mut self, id: TextureId, image: &HtmlImageElement) -> Result<(u32, u32), JsValue> {
        let gl = &self.gl;
        let texture = gl.create_texture().ok_or("could not create texture")?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            image,
        )?;
        gl.generate_mipmap(GL::TEXTURE_2D);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR_MIPMAP_LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::REPEAT as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
        gl.bind_texture(GL::TEXTURE_2D, None);

        self.textures.insert(id, texture);
        Ok((image.natural_width(), image.natural_height()))
    }

    fn bind_texture(&self, unit: u32, id: Option<TextureId>) -> bool {
        let texture = id.and_then(|id| self.textures.get(&id));
        self.gl.active_texture(GL::TEXTURE0 + unit);
        self.gl.bind_texture(GL::TEXTURE_2D, texture);
        texture.is_some()
    }

    fn draw_background(&self, scene: &Scene) {
        let gl = &self.gl;
        if !self.bind_texture(0, scene.active_background()) {
            return;
        }
        gl.use_program(Some(&self.background_program));
        gl.uniform1i(self.background_sampler.as_ref(), 0);
        gl.disable(GL::DEPTH_TEST);
        gl.depth_mask(false);
        gl.bind_vertex_array(None);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);
        gl.depth_mask(true);
        gl.enable(GL::DEPTH_TEST);
    }

    fn set_lights(&self, lights: &[Light]) {
        let mut ambient = Rgb::new(0.0, 0.0, 0.0);
        let mut point = None;
        for light in lights {
            match *light {
                Light::Ambient { color, intensity } => {
                    let c = color.scale(intensity);
                    ambient = Rgb::new(ambient.r + c.r, ambient.g + c.g, ambient.b + c.b);
                }
                // Only one point light is supported by the shader
                Light::Point {
                    color,
                    intensity,
                    position,
                } if point.is_none() => point = Some((color.scale(intensity), position)),
                Light::Point { .. } => {}
            }
        }
        let (point_color, point_position) =
            point.unwrap_or((Rgb::new(0.0, 0.0, 0.0), nalgebra::Vector3::zeros()));

        let gl = &self.gl;
        let u = &self.uniforms;
        gl.uniform3fv_with_f32_array(u.ambient.as_ref(), &ambient.to_array());
        gl.uniform3fv_with_f32_array(u.point_color.as_ref(), &point_color.to_array());
        gl.uniform3fv_with_f32_array(u.point_position.as_ref(), point_position.as_slice());
    }

    fn draw_objects(&mut self, scene: &Scene, camera: &Camera) {
        self.gl.use_program(Some(&self.mesh_program));
        self.gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.view.as_ref(),
            false,
            camera.view_matrix().as_slice(),
        );
        self.gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.projection.as_ref(),
            false,
            camera.projection_matrix().as_slice(),
        );
        self.gl.uniform1i(self.uniforms.map.as_ref(), 0);
        self.gl.uniform1i(self.uniforms.normal_map.as_ref(), 1);
        self.set_lights(&scene.lights);

        for object in scene.objects() {
            let index = match self.buffers_for(&object.shape) {
                Ok(index) => index,
                Err(e) => {
                    error!("failed to upload mesh for {:?}: {:?}", object.id, e);
                    continue;
                }
            };
            let gl = &self.gl;
            let u = &self.uniforms;
            let material = &object.material;

            gl.uniform_matrix4fv_with_f32_array(
                u.model.as_ref(),
                false,
                object.model_matrix().as_slice(),
            );
            gl.uniform3fv_with_f32_array(u.color.as_ref(), &material.color.to_array());
            gl.uniform1i(u.lit.as_ref(), material.lit as i32);
            let has_map = self.bind_texture(0, scene.active_map(material));
            gl.uniform1i(u.use_map.as_ref(), has_map as i32);
            let has_normal_map = self.bind_texture(1, scene.active_normal_map(material));
            gl.uniform1i(u.use_normal_map.as_ref(), has_normal_map as i32);

            let buffers = &self.meshes[index].1;
            gl.bind_vertex_array(Some(&buffers.vao));
            gl.draw_arrays(GL::TRIANGLES, 0, buffers.vertex_count);
        }
        self.gl.bind_vertex_array(None);
    }
}

impl SceneRenderer for GlRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
        self.draw_background(scene);
        self.draw_objects(scene, camera);
    }
}
