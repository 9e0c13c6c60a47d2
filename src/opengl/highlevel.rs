use std::ffi::c_void;

use glcore::{GL_1_0_g, GL_1_1_g, GL_1_5_g, GL_2_0_g, GL_3_0_g, GLCore, GLCoreError};

use super::shaders::builtin::{BuiltinShader, NoShader};
use super::shaders::{
    ColorShader, MvpShader, ShaderProgram, TextureShader, UninitShaderProgram,
};
use super::texture::Texture2D;
use super::types::{AsFloatArray, GlResult, Mat4, TexturedVertex, Vec2, Vec4};

#[derive(Debug, Clone, Copy)]
pub enum ElementsMode {
    TriangleFan,
    Triangles,
}

impl ElementsMode {
    pub fn into_opengl_mode(self) -> u32 {
        match self {
            ElementsMode::TriangleFan => glcore::GL_TRIANGLE_FAN,
            ElementsMode::Triangles => glcore::GL_TRIANGLES,
        }
    }
}

/// Vertex data uploaded once and drawn every frame
#[derive(Debug)]
pub struct VertexBuffer {
    vertex_attributes: u32,
    vertex_buffer: u32,
    count: i32,
    core: GLCore,
}

impl VertexBuffer {
    /// Position goes to attribute 0, texture coordinates to attribute 1
    pub fn textured<V>(core: GLCore, vertices: V) -> GlResult<VertexBuffer>
    where
        V: AsFloatArray<Backend = TexturedVertex>,
    {
        let vert_ref = vertices
            .as_contiguous_block()
            .ok_or(GLCoreError::InvalidValue("Vertex buffer cannot be zero sized"))?;
        let stride = (V::FLOATS_PER_ELEMENT * std::mem::size_of::<f32>()) as i32;
        let uv_offset = std::mem::offset_of!(TexturedVertex, uv);

        let mut vertex_attributes = 0;
        core.glGenVertexArrays(1, &mut vertex_attributes)?;
        core.glBindVertexArray(vertex_attributes)?;

        let mut vertex_buffer = 0;
        core.glGenBuffers(1, &mut vertex_buffer)?;
        core.glBindBuffer(glcore::GL_ARRAY_BUFFER, vertex_buffer)?;
        core.glBufferData(
            glcore::GL_ARRAY_BUFFER,
            std::mem::size_of_val(vert_ref),
            vert_ref.as_ptr() as *const c_void,
            glcore::GL_STATIC_DRAW,
        )?;

        core.glEnableVertexAttribArray(0)?;
        core.glVertexAttribPointer(
            0,
            3,
            glcore::GL_FLOAT,
            glcore::GL_FALSE as u8,
            stride,
            std::ptr::null(),
        )?;
        core.glEnableVertexAttribArray(1)?;
        core.glVertexAttribPointer(
            1,
            2,
            glcore::GL_FLOAT,
            glcore::GL_FALSE as u8,
            stride,
            uv_offset as *const c_void,
        )?;
        core.glBindVertexArray(0)?;

        Ok(VertexBuffer {
            vertex_attributes,
            vertex_buffer,
            count: (vert_ref.len() / V::FLOATS_PER_ELEMENT) as i32,
            core,
        })
    }

    pub fn draw(&self, mode: ElementsMode) -> GlResult<()> {
        self.core.glBindVertexArray(self.vertex_attributes)?;
        self.core
            .glDrawArrays(mode.into_opengl_mode(), 0, self.count)?;
        self.core.glBindVertexArray(0)
    }

    pub fn delete(self) -> GlResult<()> {
        self.core
            .glDeleteBuffers(1, [self.vertex_buffer].as_ptr())?;
        self.core
            .glDeleteVertexArrays(1, [self.vertex_attributes].as_ptr())
    }
}

#[derive(Debug, Clone)]
pub struct SimpleGL<State> {
    core: GLCore,
    current_shader: Option<ShaderProgram<State>>,
}

impl SimpleGL<NoShader> {
    pub fn new(core: GLCore) -> SimpleGL<NoShader> {
        SimpleGL {
            core,
            current_shader: None,
        }
    }
}

impl<S> SimpleGL<S> {
    pub fn new_builtin_shader<T: BuiltinShader<Properties = T>>(
        &self,
        builtin: T,
    ) -> GlResult<UninitShaderProgram<T>> {
        builtin.into_program(self.core)
    }

    pub fn clear(&self, color: Vec4) -> GlResult<()> {
        self.core.glClearColor(color.x, color.y, color.z, color.w)?;
        self.core
            .glClear(glcore::GL_COLOR_BUFFER_BIT | glcore::GL_DEPTH_BUFFER_BIT)
    }

    pub fn viewport(&self, width: u32, height: u32) -> GlResult<()> {
        self.core.glViewport(0, 0, width as i32, height as i32)
    }

    pub fn enable_depth_test(&self) -> GlResult<()> {
        self.core.glEnable(glcore::GL_DEPTH_TEST)?;
        self.core.glDepthFunc(glcore::GL_LESS)
    }

    pub fn with_shader<N>(self, shader: ShaderProgram<N>) -> SimpleGL<N> {
        SimpleGL {
            core: self.core,
            current_shader: Some(shader),
        }
    }

    pub fn delete_shader(self) -> GlResult<()> {
        match self.current_shader {
            Some(shader) => shader.delete(),
            None => Ok(()),
        }
    }

    fn shader(&self) -> GlResult<&ShaderProgram<S>> {
        self.current_shader
            .as_ref()
            .ok_or(GLCoreError::InvalidOperation("No shader loaded"))
    }
}

impl<S: ColorShader> SimpleGL<S> {
    /// Streams the vertices through a throwaway buffer
    pub fn draw_polygon<V>(&self, mode: ElementsMode, color: Vec4, vertices: V) -> GlResult<()>
    where
        V: AsFloatArray<Backend = Vec2>,
    {
        let vert_ref = vertices
            .as_contiguous_block()
            .ok_or(GLCoreError::InvalidValue(
                "Polygon vector cannot be zero sized",
            ))?;
        let shader = self.shader()?;
        shader.activate()?;
        shader.set_color(color)?;

        let mut vertex_attributes = 0;
        self.core.glGenVertexArrays(1, &mut vertex_attributes)?;
        self.core.glBindVertexArray(vertex_attributes)?;

        let mut vertex_buffer = 0;
        self.core.glGenBuffers(1, &mut vertex_buffer)?;
        self.core
            .glBindBuffer(glcore::GL_ARRAY_BUFFER, vertex_buffer)?;
        self.core.glBufferData(
            glcore::GL_ARRAY_BUFFER,
            std::mem::size_of_val(vert_ref),
            vert_ref.as_ptr() as *const c_void,
            glcore::GL_STREAM_DRAW,
        )?;

        self.core.glEnableVertexAttribArray(0)?;
        self.core.glVertexAttribPointer(
            0,
            V::FLOATS_PER_ELEMENT as i32,
            glcore::GL_FLOAT,
            glcore::GL_FALSE as u8,
            0,
            std::ptr::null(),
        )?;

        self.core.glDrawArrays(
            mode.into_opengl_mode(),
            0,
            (vert_ref.len() / V::FLOATS_PER_ELEMENT) as i32,
        )?;
        self.core.glDisableVertexAttribArray(0)?;
        self.core.glBindVertexArray(0)?;
        self.core.glDeleteBuffers(1, [vertex_buffer].as_ptr())?;
        self.core
            .glDeleteVertexArrays(1, [vertex_attributes].as_ptr())
    }
}

impl<S: MvpShader + TextureShader> SimpleGL<S> {
    pub fn draw_textured(
        &self,
        mode: ElementsMode,
        buffer: &VertexBuffer,
        texture: &Texture2D,
        mvp: &Mat4,
    ) -> GlResult<()> {
        let shader = self.shader()?;
        shader.activate()?;
        texture.bind(0)?;
        shader.set_texture_unit(0)?;
        shader.set_mvp(mvp)?;
        buffer.draw(mode)
    }
}
