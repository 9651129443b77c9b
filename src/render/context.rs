// context.rs - Graphics API seam used by the shader builder

use crate::render::source::ShaderStage;
use gl::types::*;
use std::ffi::{CStr, CString, NulError};
use std::fmt;
use std::ptr;

pub type ShaderHandle = GLuint;
pub type ProgramHandle = GLuint;

/// Raw reflection data for one active attribute or uniform, as the driver
/// reports it. Arrays come back once, named `foo[0]`, with `size` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInfo {
    pub name: String,
    pub size: i32,
    pub gl_type: GLenum,
}

/// The subset of an OpenGL binding needed to build and inspect programs.
///
/// Every call assumes the context is current on the calling thread.
pub trait GraphicsContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle>;
    fn shader_source(&self, shader: ShaderHandle, source: &str) -> Result<(), NulError>;
    fn compile_shader(&self, shader: ShaderHandle);
    fn compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> Option<ProgramHandle>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn link_status(&self, program: ProgramHandle) -> bool;
    fn validate_program(&self, program: ProgramHandle);
    fn validate_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn attached_shader_count(&self, program: ProgramHandle) -> i32;
    fn use_program(&self, program: ProgramHandle);
    fn delete_program(&self, program: ProgramHandle);

    fn active_attribute_count(&self, program: ProgramHandle) -> u32;
    fn active_attribute(&self, program: ProgramHandle, index: u32) -> ActiveInfo;
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> i32;

    fn active_uniform_count(&self, program: ProgramHandle) -> u32;
    fn active_uniform(&self, program: ProgramHandle, index: u32) -> ActiveInfo;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32;
}

/// Global `gl` function pointers. Construct only after `gl::load_with` ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlContext;

impl GlContext {
    pub fn new() -> Self {
        GlContext
    }

    pub fn info(&self) -> ContextInfo {
        ContextInfo {
            renderer: gl_string(gl::RENDERER),
            vendor: gl_string(gl::VENDOR),
            version: gl_string(gl::VERSION),
            shading_language: gl_string(gl::SHADING_LANGUAGE_VERSION),
            params: query_params(),
        }
    }
}

fn gl_string(name: GLenum) -> String {
    unsafe {
        let raw = gl::GetString(name);
        if raw.is_null() {
            return String::from("unknown");
        }
        CStr::from_ptr(raw as *const _).to_string_lossy().into_owned()
    }
}

fn read_log(len: GLint, fill: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }
    let mut buffer: Vec<u8> = vec![0; len as usize];
    let mut written: GLsizei = 0;
    fill(len, &mut written as *mut GLsizei, buffer.as_mut_ptr() as *mut GLchar);
    buffer.truncate(written.clamp(0, len) as usize);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn active_info(
    max_len: GLint,
    fill: impl FnOnce(GLsizei, *mut GLsizei, *mut GLint, *mut GLenum, *mut GLchar),
) -> ActiveInfo {
    let cap = max_len.max(1);
    let mut buffer: Vec<u8> = vec![0; cap as usize];
    let mut written: GLsizei = 0;
    let mut size: GLint = 0;
    let mut gl_type: GLenum = 0;
    fill(
        cap,
        &mut written as *mut GLsizei,
        &mut size as *mut GLint,
        &mut gl_type as *mut GLenum,
        buffer.as_mut_ptr() as *mut GLchar,
    );
    buffer.truncate(written.clamp(0, cap) as usize);
    ActiveInfo {
        name: String::from_utf8_lossy(&buffer).into_owned(),
        size,
        gl_type,
    }
}

fn program_iv(program: ProgramHandle, pname: GLenum) -> GLint {
    let mut value = 0;
    unsafe {
        gl::GetProgramiv(program, pname, &mut value);
    }
    value
}

impl GraphicsContext for GlContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let shader = unsafe { gl::CreateShader(stage.gl_enum()) };
        (shader != 0).then_some(shader)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) -> Result<(), NulError> {
        let c_str = CString::new(source.as_bytes())?;
        unsafe {
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
        }
        Ok(())
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { gl::CompileShader(shader) };
    }

    fn compile_status(&self, shader: ShaderHandle) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }
        read_log(len, |cap, written, buf| unsafe {
            gl::GetShaderInfoLog(shader, cap, written, buf);
        })
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let program = unsafe { gl::CreateProgram() };
        (program != 0).then_some(program)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { gl::LinkProgram(program) };
    }

    fn link_status(&self, program: ProgramHandle) -> bool {
        program_iv(program, gl::LINK_STATUS) != 0
    }

    fn validate_program(&self, program: ProgramHandle) {
        unsafe { gl::ValidateProgram(program) };
    }

    fn validate_status(&self, program: ProgramHandle) -> bool {
        program_iv(program, gl::VALIDATE_STATUS) != 0
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        let len = program_iv(program, gl::INFO_LOG_LENGTH);
        read_log(len, |cap, written, buf| unsafe {
            gl::GetProgramInfoLog(program, cap, written, buf);
        })
    }

    fn attached_shader_count(&self, program: ProgramHandle) -> i32 {
        program_iv(program, gl::ATTACHED_SHADERS)
    }

    fn use_program(&self, program: ProgramHandle) {
        unsafe { gl::UseProgram(program) };
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn active_attribute_count(&self, program: ProgramHandle) -> u32 {
        program_iv(program, gl::ACTIVE_ATTRIBUTES).max(0) as u32
    }

    fn active_attribute(&self, program: ProgramHandle, index: u32) -> ActiveInfo {
        let max_len = program_iv(program, gl::ACTIVE_ATTRIBUTE_MAX_LENGTH);
        active_info(max_len, |cap, written, size, ty, name| unsafe {
            gl::GetActiveAttrib(program, index, cap, written, size, ty, name);
        })
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> i32 {
        match CString::new(name) {
            Ok(cname) => unsafe { gl::GetAttribLocation(program, cname.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn active_uniform_count(&self, program: ProgramHandle) -> u32 {
        program_iv(program, gl::ACTIVE_UNIFORMS).max(0) as u32
    }

    fn active_uniform(&self, program: ProgramHandle, index: u32) -> ActiveInfo {
        let max_len = program_iv(program, gl::ACTIVE_UNIFORM_MAX_LENGTH);
        active_info(max_len, |cap, written, size, ty, name| unsafe {
            gl::GetActiveUniform(program, index, cap, written, size, ty, name);
        })
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32 {
        match CString::new(name) {
            Ok(cname) => unsafe { gl::GetUniformLocation(program, cname.as_ptr()) },
            Err(_) => -1,
        }
    }
}

/// One implementation limit reported by the current context.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Pair(i32, i32),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Pair(a, b) => write!(f, "{} {}", a, b),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

const INT_PARAMS: [(GLenum, &str); 10] = [
    (gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, "GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS"),
    (gl::MAX_CUBE_MAP_TEXTURE_SIZE, "GL_MAX_CUBE_MAP_TEXTURE_SIZE"),
    (gl::MAX_DRAW_BUFFERS, "GL_MAX_DRAW_BUFFERS"),
    (gl::MAX_FRAGMENT_UNIFORM_COMPONENTS, "GL_MAX_FRAGMENT_UNIFORM_COMPONENTS"),
    (gl::MAX_TEXTURE_IMAGE_UNITS, "GL_MAX_TEXTURE_IMAGE_UNITS"),
    (gl::MAX_TEXTURE_SIZE, "GL_MAX_TEXTURE_SIZE"),
    (gl::MAX_VARYING_FLOATS, "GL_MAX_VARYING_FLOATS"),
    (gl::MAX_VERTEX_ATTRIBS, "GL_MAX_VERTEX_ATTRIBS"),
    (gl::MAX_VERTEX_TEXTURE_IMAGE_UNITS, "GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS"),
    (gl::MAX_VERTEX_UNIFORM_COMPONENTS, "GL_MAX_VERTEX_UNIFORM_COMPONENTS"),
];

fn query_params() -> Vec<(&'static str, ParamValue)> {
    let mut params = Vec::with_capacity(INT_PARAMS.len() + 2);
    unsafe {
        for (pname, label) in INT_PARAMS {
            let mut value = 0;
            gl::GetIntegerv(pname, &mut value);
            params.push((label, ParamValue::Int(value)));
        }

        let mut dims = [0; 2];
        gl::GetIntegerv(gl::MAX_VIEWPORT_DIMS, dims.as_mut_ptr());
        params.push(("GL_MAX_VIEWPORT_DIMS", ParamValue::Pair(dims[0], dims[1])));

        let mut stereo: GLboolean = gl::FALSE;
        gl::GetBooleanv(gl::STEREO, &mut stereo);
        params.push(("GL_STEREO", ParamValue::Bool(stereo == gl::TRUE)));
    }
    params
}

/// Renderer identification plus implementation limits of the current context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    pub renderer: String,
    pub vendor: String,
    pub version: String,
    pub shading_language: String,
    pub params: Vec<(&'static str, ParamValue)>,
}

impl ContextInfo {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Renderer: {}", self.renderer),
            format!("Vendor: {}", self.vendor),
            format!("OpenGL version supported: {}", self.version),
            format!("GLSL version: {}", self.shading_language),
            String::from("GL context params:"),
        ];
        lines.extend(
            self.params
                .iter()
                .map(|(name, value)| format!("{} {}", name, value)),
        );
        lines
    }
}
