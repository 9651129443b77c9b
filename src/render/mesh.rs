use gl::types::*;
use std::mem;
use std::ptr;

/// Two triangles covering the middle of the viewport, `[x, y, z]` per vertex.
pub const QUAD_VERTICES: [f32; 18] = [
    -0.5, 0.5, 0.0, //
    0.5, 0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    -0.5, -0.5, 0.0, //
    -0.5, 0.5, 0.0, //
];

pub const COMPONENTS_PER_VERTEX: usize = 3;

pub struct MeshData {
    pub positions: Vec<f32>,
}

impl MeshData {
    pub fn new(positions: &[f32]) -> Self {
        Self {
            positions: positions.to_vec(),
        }
    }

    pub fn quad() -> Self {
        Self::new(&QUAD_VERTICES)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / COMPONENTS_PER_VERTEX
    }
}

/// Uploaded vertex buffer plus the vertex array describing it.
pub struct Mesh {
    vao: GLuint,
    vbo: GLuint,
    vertex_count: GLsizei,
}

impl Mesh {
    /// Uploads `data` and binds it to attribute `location` as `vec3`.
    pub fn new(data: &MeshData, location: GLuint) -> Self {
        let mut vao = 0;
        let mut vbo = 0;
        unsafe {
            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (data.positions.len() * mem::size_of::<f32>()) as GLsizeiptr,
                data.positions.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
            gl::EnableVertexAttribArray(location);
            gl::VertexAttribPointer(
                location,
                COMPONENTS_PER_VERTEX as GLint,
                gl::FLOAT,
                gl::FALSE,
                0,
                ptr::null(),
            );
            gl::BindVertexArray(0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }

        Self {
            vao,
            vbo,
            vertex_count: data.vertex_count() as GLsizei,
        }
    }

    pub fn bind(&self) {
        unsafe { gl::BindVertexArray(self.vao) };
    }

    pub fn draw(&self) {
        self.bind();
        unsafe {
            gl::DrawArrays(gl::TRIANGLES, 0, self.vertex_count);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
        }
    }
}
