//! In-memory stand-in for a GL context, used by unit tests.
//!
//! Compilation is a brace/entry-point check, linking matches fragment `in`
//! declarations against vertex `out` declarations, and reflection reports the
//! global `in` (vertex stage) and `uniform` declarations.

use crate::render::context::{ActiveInfo, GraphicsContext, ProgramHandle, ShaderHandle};
use crate::render::source::ShaderStage;
use gl::types::GLenum;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CString, NulError};
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Declaration {
    qualifier: String,
    gl_type: GLenum,
    type_name: String,
    name: String,
    size: i32,
    location: Option<i32>,
}

#[derive(Debug, Default)]
struct FakeShader {
    stage: Option<ShaderStage>,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<ShaderHandle>,
    linked: bool,
    log: String,
    attributes: Vec<(Declaration, i32)>,
    uniforms: Vec<(Declaration, i32)>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: HashMap<ShaderHandle, FakeShader>,
    programs: HashMap<ProgramHandle, FakeProgram>,
    compiled_stages: Vec<ShaderStage>,
    validation_error: Option<String>,
    location_queries: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeContext {
    state: Rc<RefCell<State>>,
}

impl FakeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn compiled_stages(&self) -> Vec<ShaderStage> {
        self.state.borrow().compiled_stages.clone()
    }

    pub fn location_queries(&self) -> usize {
        self.state.borrow().location_queries
    }

    pub fn fail_validation(&self, log: &str) {
        self.state.borrow_mut().validation_error = Some(log.to_string());
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }
}

fn type_enum(name: &str) -> GLenum {
    match name {
        "bool" => gl::BOOL,
        "int" => gl::INT,
        "uint" => gl::UNSIGNED_INT,
        "float" => gl::FLOAT,
        "vec2" => gl::FLOAT_VEC2,
        "vec3" => gl::FLOAT_VEC3,
        "vec4" => gl::FLOAT_VEC4,
        "mat2" => gl::FLOAT_MAT2,
        "mat3" => gl::FLOAT_MAT3,
        "mat4" => gl::FLOAT_MAT4,
        "sampler2D" => gl::SAMPLER_2D,
        "samplerCube" => gl::SAMPLER_CUBE,
        _ => 0,
    }
}

/// Global `in`/`out`/`uniform` declarations, one per statement.
fn declarations(source: &str) -> Vec<Declaration> {
    let mut found = Vec::new();
    for statement in source.split(';') {
        let mut text = statement.trim();
        if text.contains('{') || text.contains('}') || text.starts_with('#') {
            // only the part after the last line break can be a declaration
            text = text.rsplit('\n').next().unwrap_or("").trim();
        }

        let mut location = None;
        if let Some(rest) = text.strip_prefix("layout") {
            let (Some(open), Some(close)) = (rest.find('('), rest.find(')')) else {
                continue;
            };
            location = rest[open + 1..close]
                .split('=')
                .nth(1)
                .and_then(|v| v.trim().parse().ok());
            text = rest[close + 1..].trim();
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let &[qualifier, type_name, declarator] = tokens.as_slice() else {
            continue;
        };
        if !matches!(qualifier, "in" | "out" | "uniform") {
            continue;
        }

        let (name, size) = match declarator.split_once('[') {
            Some((base, count)) => (
                base.to_string(),
                count.trim_end_matches(']').parse().unwrap_or(1),
            ),
            None => (declarator.to_string(), 1),
        };

        found.push(Declaration {
            qualifier: qualifier.to_string(),
            gl_type: type_enum(type_name),
            type_name: type_name.to_string(),
            name,
            size,
            location,
        });
    }
    found
}

fn syntax_error(source: &str) -> Option<String> {
    let mut depth = 0i32;
    for (line_no, line) in source.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Some(format!("0:{}(1): error: syntax error, unexpected '}}'", line_no + 1));
            }
        }
    }
    if depth != 0 {
        return Some("0:1(1): error: syntax error, unexpected end of file".to_string());
    }
    if !source.contains("void main") {
        return Some("error: missing entry point main()".to_string());
    }
    None
}

fn assign_locations(decls: Vec<Declaration>) -> Vec<(Declaration, i32)> {
    let mut next = 0;
    decls
        .into_iter()
        .map(|decl| {
            let location = decl.location.unwrap_or(next);
            next = location + decl.size;
            (decl, location)
        })
        .collect()
}

fn reported(decl: &Declaration) -> ActiveInfo {
    let name = if decl.size > 1 {
        format!("{}[0]", decl.name)
    } else {
        decl.name.clone()
    };
    ActiveInfo {
        name,
        size: decl.size,
        gl_type: decl.gl_type,
    }
}

fn locate(vars: &[(Declaration, i32)], name: &str) -> i32 {
    let (base, index) = match name.split_once('[') {
        Some((base, rest)) => (base, rest.trim_end_matches(']').parse().unwrap_or(0)),
        None => (name, 0),
    };
    vars.iter()
        .find(|(decl, _)| decl.name == base && index < decl.size)
        .map_or(-1, |(_, location)| location + index)
}

impl GraphicsContext for FakeContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let id = self.next_id();
        self.state.borrow_mut().shaders.insert(
            id,
            FakeShader {
                stage: Some(stage),
                ..Default::default()
            },
        );
        Some(id)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) -> Result<(), NulError> {
        CString::new(source)?;
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
        Ok(())
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let Some(s) = state.shaders.get_mut(&shader) else {
            return;
        };
        let stage = s.stage;
        match syntax_error(&s.source) {
            Some(log) => {
                s.compiled = false;
                s.log = log;
            }
            None => {
                s.compiled = true;
                s.log.clear();
            }
        }
        if let Some(stage) = stage {
            state.compiled_stages.push(stage);
        }
    }

    fn compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let id = self.next_id();
        self.state
            .borrow_mut()
            .programs
            .insert(id, FakeProgram::default());
        Some(id)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let State {
            shaders, programs, ..
        } = &mut *state;
        let Some(p) = programs.get_mut(&program) else {
            return;
        };

        let mut vertex = Vec::new();
        let mut fragment = Vec::new();
        for id in &p.attached {
            match shaders.get(id) {
                Some(s) if s.stage == Some(ShaderStage::Vertex) => vertex = declarations(&s.source),
                Some(s) if s.stage == Some(ShaderStage::Fragment) => fragment = declarations(&s.source),
                _ => {}
            }
        }

        let unmatched = fragment.iter().find(|input| {
            input.qualifier == "in"
                && !vertex.iter().any(|output| {
                    output.qualifier == "out"
                        && output.name == input.name
                        && output.type_name == input.type_name
                })
        });
        if let Some(input) = unmatched {
            p.linked = false;
            p.log = format!(
                "error: fragment shader input `{}' has no matching vertex shader output",
                input.name
            );
            return;
        }

        let attributes = vertex.iter().filter(|d| d.qualifier == "in").cloned().collect();
        let mut uniforms: Vec<Declaration> = Vec::new();
        for decl in vertex.iter().chain(fragment.iter()) {
            if decl.qualifier == "uniform" && !uniforms.iter().any(|u| u.name == decl.name) {
                uniforms.push(decl.clone());
            }
        }

        p.linked = true;
        p.log.clear();
        p.attributes = assign_locations(attributes);
        p.uniforms = assign_locations(uniforms);
    }

    fn link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn validate_program(&self, _program: ProgramHandle) {}

    fn validate_status(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let error = state.validation_error.clone();
        match (state.programs.get_mut(&program), error) {
            (Some(p), Some(log)) => {
                p.log = log;
                false
            }
            (Some(p), None) => p.linked,
            (None, _) => false,
        }
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn attached_shader_count(&self, program: ProgramHandle) -> i32 {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.attached.len() as i32)
    }

    fn use_program(&self, _program: ProgramHandle) {}

    fn delete_program(&self, program: ProgramHandle) {
        self.state.borrow_mut().programs.remove(&program);
    }

    fn active_attribute_count(&self, program: ProgramHandle) -> u32 {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.attributes.len() as u32)
    }

    fn active_attribute(&self, program: ProgramHandle, index: u32) -> ActiveInfo {
        let state = self.state.borrow();
        reported(&state.programs[&program].attributes[index as usize].0)
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> i32 {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map_or(-1, |p| locate(&p.attributes, name))
    }

    fn active_uniform_count(&self, program: ProgramHandle) -> u32 {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: ProgramHandle, index: u32) -> ActiveInfo {
        let state = self.state.borrow();
        reported(&state.programs[&program].uniforms[index as usize].0)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        state.location_queries += 1;
        state
            .programs
            .get(&program)
            .map_or(-1, |p| locate(&p.uniforms, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_parse_layout_and_arrays() {
        let decls = declarations(
            "#version 330 core\nlayout(location = 2) in vec3 pos;\nuniform vec4 colours[4];\nvoid main() { }",
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "pos");
        assert_eq!(decls[0].location, Some(2));
        assert_eq!(decls[1].name, "colours");
        assert_eq!(decls[1].size, 4);
    }

    #[test]
    fn test_syntax_error_detection() {
        assert!(syntax_error("void main() { }").is_none());
        assert!(syntax_error("void main() { ").is_some());
        assert!(syntax_error("void main() } {").is_some());
        assert!(syntax_error("void other() {}").is_some());
    }
}
