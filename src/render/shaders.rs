// shaders.rs - Shader program building and reflection

use crate::render::context::{ActiveInfo, GraphicsContext, ProgramHandle, ShaderHandle};
use crate::render::source::{ShaderSource, ShaderStage, TextSource};
use crate::utils::error::ShaderError;
use gl::types::GLenum;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;

/// A linked vertex + fragment program. Deletes its handle on drop.
pub struct ShaderProgram<C: GraphicsContext + Clone> {
    ctx: C,
    id: ProgramHandle,
    uniforms: HashMap<String, i32>,
}

/// Active attribute or uniform after array expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    pub gl_type: GLenum,
    pub location: i32,
}

impl fmt::Display for ActiveVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} location: {}",
            gl_type_name(self.gl_type),
            self.name,
            self.location
        )
    }
}

/// Compiles both stages, links them and returns the program.
///
/// A failed stage or link is never returned as a program; the driver's log
/// travels with the error instead.
pub fn build_program<C: GraphicsContext + Clone>(
    ctx: &C,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
) -> Result<ShaderProgram<C>, ShaderError> {
    for source in [vertex, fragment] {
        if source.is_blank() {
            return Err(ShaderError::EmptySource(source.stage()));
        }
    }

    let vertex_shader = compile_shader(ctx, vertex.stage(), vertex.text())?;
    let fragment_shader = match compile_shader(ctx, fragment.stage(), fragment.text()) {
        Ok(shader) => shader,
        Err(err) => {
            ctx.delete_shader(vertex_shader);
            return Err(err);
        }
    };

    let result = link_program(ctx, vertex_shader, fragment_shader);
    ctx.delete_shader(vertex_shader);
    ctx.delete_shader(fragment_shader);
    let id = result?;

    info!("Shader program {} linked", id);
    Ok(ShaderProgram {
        ctx: ctx.clone(),
        id,
        uniforms: HashMap::new(),
    })
}

/// Reads both sources from `provider` and builds them.
pub fn load_program<C, P>(
    ctx: &C,
    provider: &P,
    vertex_path: &str,
    fragment_path: &str,
) -> Result<ShaderProgram<C>, ShaderError>
where
    C: GraphicsContext + Clone,
    P: TextSource + ?Sized,
{
    let vertex = ShaderSource::load(provider, ShaderStage::Vertex, vertex_path)?;
    let fragment = ShaderSource::load(provider, ShaderStage::Fragment, fragment_path)?;
    debug!("Loaded shader sources {} and {}", vertex_path, fragment_path);
    build_program(ctx, &vertex, &fragment)
}

fn compile_shader<C: GraphicsContext>(
    ctx: &C,
    stage: ShaderStage,
    text: &str,
) -> Result<ShaderHandle, ShaderError> {
    let shader = ctx.create_shader(stage).ok_or(ShaderError::Create("shader"))?;

    if let Err(err) = ctx.shader_source(shader, text) {
        ctx.delete_shader(shader);
        return Err(err.into());
    }
    ctx.compile_shader(shader);

    if !ctx.compile_status(shader) {
        let log = ctx.shader_info_log(shader);
        ctx.delete_shader(shader);
        return Err(ShaderError::compile(stage, log));
    }

    debug!("Compiled {} shader {}", stage, shader);
    Ok(shader)
}

fn link_program<C: GraphicsContext>(
    ctx: &C,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> Result<ProgramHandle, ShaderError> {
    let program = ctx.create_program().ok_or(ShaderError::Create("program"))?;
    ctx.attach_shader(program, vertex);
    ctx.attach_shader(program, fragment);
    ctx.link_program(program);

    if !ctx.link_status(program) {
        let log = ctx.program_info_log(program);
        ctx.delete_program(program);
        return Err(ShaderError::link(log));
    }

    Ok(program)
}

/// Expands one reflected entry into per-element variables.
///
/// Drivers report arrays once, usually as `name[0]`; every element gets its
/// own `name[i]` entry with its own location.
fn expand_active(info: &ActiveInfo, locate: impl Fn(&str) -> i32) -> Vec<ActiveVariable> {
    if info.size <= 1 {
        return vec![ActiveVariable {
            name: info.name.clone(),
            gl_type: info.gl_type,
            location: locate(&info.name),
        }];
    }

    let base = info.name.strip_suffix("[0]").unwrap_or(&info.name);
    (0..info.size)
        .map(|i| {
            let name = format!("{}[{}]", base, i);
            let location = locate(&name);
            ActiveVariable {
                name,
                gl_type: info.gl_type,
                location,
            }
        })
        .collect()
}

impl<C: GraphicsContext + Clone> ShaderProgram<C> {
    pub fn id(&self) -> ProgramHandle {
        self.id
    }

    pub fn bind(&self) {
        self.ctx.use_program(self.id);
    }

    pub fn is_linked(&self) -> bool {
        self.ctx.link_status(self.id)
    }

    /// Checks the program can execute against the current pipeline state.
    pub fn validate(&self) -> Result<(), ShaderError> {
        self.ctx.validate_program(self.id);
        if self.ctx.validate_status(self.id) {
            debug!("Program {} validated", self.id);
            Ok(())
        } else {
            Err(ShaderError::validation(self.ctx.program_info_log(self.id)))
        }
    }

    pub fn active_attributes(&self) -> Vec<ActiveVariable> {
        (0..self.ctx.active_attribute_count(self.id))
            .flat_map(|index| {
                let info = self.ctx.active_attribute(self.id, index);
                expand_active(&info, |name| self.ctx.attribute_location(self.id, name))
            })
            .collect()
    }

    pub fn active_uniforms(&self) -> Vec<ActiveVariable> {
        (0..self.ctx.active_uniform_count(self.id))
            .flat_map(|index| {
                let info = self.ctx.active_uniform(self.id, index);
                expand_active(&info, |name| self.ctx.uniform_location(self.id, name))
            })
            .collect()
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        let location = self.ctx.attribute_location(self.id, name);
        (location >= 0).then_some(location as u32)
    }

    /// Cached uniform lookup; unknown names are cached as -1 and warned once.
    pub fn uniform_location(&mut self, name: &str) -> i32 {
        if let Some(location) = self.uniforms.get(name) {
            return *location;
        }

        let location = self.ctx.uniform_location(self.id, name);
        if location == -1 {
            log::warn!("Uniform '{}' not found in shader", name);
        }

        self.uniforms.insert(name.to_string(), location);
        location
    }

    pub fn report(&self) -> ProgramReport {
        ProgramReport {
            program: self.id,
            linked: self.is_linked(),
            attached_shaders: self.ctx.attached_shader_count(self.id),
            attributes: self.active_attributes(),
            uniforms: self.active_uniforms(),
        }
    }
}

impl<C: GraphicsContext + Clone> Drop for ShaderProgram<C> {
    fn drop(&mut self) {
        self.ctx.delete_program(self.id);
    }
}

impl<C: GraphicsContext + Clone> fmt::Debug for ShaderProgram<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram").field("id", &self.id).finish()
    }
}

/// Everything worth printing about a built program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramReport {
    pub program: ProgramHandle,
    pub linked: bool,
    pub attached_shaders: i32,
    pub attributes: Vec<ActiveVariable>,
    pub uniforms: Vec<ActiveVariable>,
}

impl fmt::Display for ProgramReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "shader programme {} info:", self.program)?;
        writeln!(f, "GL_LINK_STATUS = {}", self.linked)?;
        writeln!(f, "GL_ATTACHED_SHADERS = {}", self.attached_shaders)?;
        writeln!(f, "GL_ACTIVE_ATTRIBUTES = {}", self.attributes.len())?;
        for (i, var) in self.attributes.iter().enumerate() {
            writeln!(f, "  {}) {}", i, var)?;
        }
        writeln!(f, "GL_ACTIVE_UNIFORMS = {}", self.uniforms.len())?;
        for (i, var) in self.uniforms.iter().enumerate() {
            writeln!(f, "  {}) {}", i, var)?;
        }
        Ok(())
    }
}

/// GLSL spelling of a reflected GL type.
pub fn gl_type_name(gl_type: GLenum) -> &'static str {
    match gl_type {
        gl::BOOL => "bool",
        gl::INT => "int",
        gl::UNSIGNED_INT => "uint",
        gl::FLOAT => "float",
        gl::FLOAT_VEC2 => "vec2",
        gl::FLOAT_VEC3 => "vec3",
        gl::FLOAT_VEC4 => "vec4",
        gl::INT_VEC2 => "ivec2",
        gl::INT_VEC3 => "ivec3",
        gl::INT_VEC4 => "ivec4",
        gl::FLOAT_MAT2 => "mat2",
        gl::FLOAT_MAT3 => "mat3",
        gl::FLOAT_MAT4 => "mat4",
        gl::SAMPLER_2D => "sampler2D",
        gl::SAMPLER_3D => "sampler3D",
        gl::SAMPLER_CUBE => "samplerCube",
        gl::SAMPLER_2D_SHADOW => "sampler2DShadow",
        _ => "other",
    }
}

/// The fixed two-triangle shader pair.
pub mod triangle_shaders {
    pub const VERTEX_SRC: &str = r#"#version 330 core
in vec3 vertexCoord;

void main() {
    gl_Position = vec4(vertexCoord, 1.0);
}
"#;

    pub const FRAGMENT_SRC: &str = r#"#version 330 core
out vec4 frag_colour;

void main() {
    frag_colour = vec4(0.5, 0.0, 0.5, 1.0);
}
"#;
}
