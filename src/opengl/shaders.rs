use glcore::{GL_2_0_g, GLCore, GLCoreError};
use log::error;
use std::ffi::CStr;
use std::marker::PhantomData;

use super::types::{GlResult, Mat4, Vec4};

pub mod builtin {
    use super::ShaderBundle;
    use crate::opengl::{shaders::UninitShaderProgram, types::GlResult};
    use glcore::GLCore;

    macro_rules! builtin_shader {
        ($name:ident <- $file:literal | $($properties:ident):*) => {
            builtin_shader!($name <- $file);

            $(
                impl super::$properties for $name {}
            )*
        };
        ($name:ident <- $file:literal) => {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name;

            impl BuiltinShader for $name {
                type Properties = $name;

                fn vertex_source(self) -> &'static str {
                    include_str!(concat!("shaders/", $file, ".vert"))
                }
                fn fragment_source(self) -> &'static str {
                    include_str!(concat!("shaders/", $file, ".frag"))
                }
                fn into_program(self, core: GLCore) -> GlResult<UninitShaderProgram<Self::Properties>> {
                    ShaderBundle::new_from_sources(core, self.vertex_source(), self.fragment_source())?.link()
                }
            }
        };
    }

    pub trait BuiltinShader {
        type Properties;

        fn vertex_source(self) -> &'static str;
        fn fragment_source(self) -> &'static str;
        fn into_program(self, core: GLCore) -> GlResult<UninitShaderProgram<Self::Properties>>;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NoShader;

    builtin_shader!(FlatColor <- "flat_color" | ColorShader);
    builtin_shader!(TexturedCube <- "textured_cube" | MvpShader:TextureShader);
}

#[derive(Debug, Clone, Copy)]
pub enum ProgramValidation {
    Vertex,
    Fragment,
    Linking,
}

impl ProgramValidation {
    fn label(self) -> &'static str {
        match self {
            ProgramValidation::Vertex => "compiling vertex",
            ProgramValidation::Fragment => "compiling fragment",
            ProgramValidation::Linking => "linking shaders",
        }
    }

    fn pname(self) -> u32 {
        match self.is_program() {
            true => glcore::GL_LINK_STATUS,
            false => glcore::GL_COMPILE_STATUS,
        }
    }

    fn is_program(self) -> bool {
        matches!(self, ProgramValidation::Linking)
    }
}

const INFO_LOG_CAPACITY: usize = 1024;

fn info_log(core: &GLCore, object: u32, validate_type: ProgramValidation) -> GlResult<String> {
    let mut log: [glcore::GLchar; INFO_LOG_CAPACITY] = [0; INFO_LOG_CAPACITY];
    let mut written = 0;
    match validate_type.is_program() {
        true => core.glGetProgramInfoLog(
            object,
            INFO_LOG_CAPACITY as i32,
            &mut written,
            log.as_mut_ptr(),
        )?,
        false => core.glGetShaderInfoLog(
            object,
            INFO_LOG_CAPACITY as i32,
            &mut written,
            log.as_mut_ptr(),
        )?,
    }
    let bytes: Vec<u8> = log
        .into_iter()
        .take(written.clamp(0, INFO_LOG_CAPACITY as i32) as usize)
        .map(|byte| byte as u8)
        .collect();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn validate_shader_step(
    core: &GLCore,
    shader_or_program: u32,
    validate_type: ProgramValidation,
) -> GlResult<()> {
    let mut status = 0;
    let pname = validate_type.pname();

    match validate_type.is_program() {
        true => core.glGetProgramiv(shader_or_program, pname, &mut status)?,
        false => core.glGetShaderiv(shader_or_program, pname, &mut status)?,
    }
    if status == glcore::GL_FALSE as i32 {
        error!(
            "failed {}: {}",
            validate_type.label(),
            info_log(core, shader_or_program, validate_type)?.trim_end()
        );
        return Err(GLCoreError::UnknownError((1, "Shader failed compilation")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn kind(self) -> u32 {
        match self {
            ShaderKind::Vertex => glcore::GL_VERTEX_SHADER,
            ShaderKind::Fragment => glcore::GL_FRAGMENT_SHADER,
        }
    }
}

impl From<ShaderKind> for ProgramValidation {
    fn from(value: ShaderKind) -> Self {
        match value {
            ShaderKind::Vertex => ProgramValidation::Vertex,
            ShaderKind::Fragment => ProgramValidation::Fragment,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shader {
    shader_id: u32,
}

impl Shader {
    pub fn load_shader(core: GLCore, kind: ShaderKind, source: &str) -> GlResult<Shader> {
        if !source.is_ascii() {
            return Err(GLCoreError::InvalidValue(
                "Shader source must only contain ASCII",
            ));
        }

        let mut source = source.to_owned();
        if !source.ends_with('\0') {
            source.push('\0');
        }
        let cstr_source = CStr::from_bytes_with_nul(source.as_bytes()).map_err(|_| {
            GLCoreError::InvalidValue("Shader source cannot be represented as a C-style string")
        })?;
        let shader_sources = [cstr_source.as_ptr()];
        let shader_id = core.glCreateShader(kind.kind())?;

        core.glShaderSource(shader_id, 1, shader_sources.as_ptr(), std::ptr::null())?;
        core.glCompileShader(shader_id)?;
        if let Err(err) = validate_shader_step(&core, shader_id, kind.into()) {
            core.glDeleteShader(shader_id)?;
            return Err(err);
        }

        Ok(Shader { shader_id })
    }
}

#[derive(Debug, Clone)]
pub struct ShaderBundle {
    vertex: Shader,
    fragment: Shader,
    core: GLCore,
}

impl ShaderBundle {
    pub fn new_from_sources(core: GLCore, vertex: &str, fragment: &str) -> GlResult<ShaderBundle> {
        Ok(ShaderBundle {
            vertex: Shader::load_shader(core, ShaderKind::Vertex, vertex)?,
            fragment: Shader::load_shader(core, ShaderKind::Fragment, fragment)?,
            core,
        })
    }

    pub fn link<F>(self) -> GlResult<UninitShaderProgram<F>> {
        let shader_program = self.core.glCreateProgram()?;
        self.core
            .glAttachShader(shader_program, self.vertex.shader_id)?;
        self.core
            .glAttachShader(shader_program, self.fragment.shader_id)?;
        self.core.glLinkProgram(shader_program)?;
        let linked = validate_shader_step(&self.core, shader_program, ProgramValidation::Linking);

        self.core
            .glDetachShader(shader_program, self.vertex.shader_id)?;
        self.core
            .glDetachShader(shader_program, self.fragment.shader_id)?;
        self.core.glDeleteShader(self.vertex.shader_id)?;
        self.core.glDeleteShader(self.fragment.shader_id)?;
        if let Err(err) = linked {
            self.core.glDeleteProgram(shader_program)?;
            return Err(err);
        }

        Ok(UninitShaderProgram {
            program: shader_program,
            core: self.core,
            _phantom: PhantomData,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum UniformKind<'a> {
    Uniform1i(i32),
    Uniform4f(f32, f32, f32, f32),
    UniformMatrix4fv(i32, bool, &'a [f32]),
}

impl<'a> UniformKind<'a> {
    fn exec(self, core: &GLCore, location: i32) -> GlResult<()> {
        match self {
            Self::Uniform1i(v0) => core.glUniform1i(location, v0)?,
            Self::Uniform4f(v0, v1, v2, v3) => core.glUniform4f(location, v0, v1, v2, v3)?,
            Self::UniformMatrix4fv(count, transpose, value) => {
                core.glUniformMatrix4fv(location, count, transpose as u8, value.as_ptr())?
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UninitShaderProgram<F> {
    program: u32,
    core: GLCore,
    _phantom: PhantomData<F>,
}

impl<F> UninitShaderProgram<F> {
    pub fn use_program(self) -> GlResult<ShaderProgram<F>> {
        self.core.glUseProgram(self.program)?;
        Ok(ShaderProgram {
            program: self.program,
            core: self.core,
            _phantom: PhantomData,
        })
    }
}

pub trait ColorShader {}
pub trait MvpShader {}
pub trait TextureShader {}

#[derive(Debug, Clone, Copy)]
pub struct ShaderProgram<F> {
    program: u32,
    core: GLCore,
    _phantom: PhantomData<F>,
}

impl<F> ShaderProgram<F> {
    /// Makes this program current again after another one was used
    pub fn activate(&self) -> GlResult<()> {
        self.core.glUseProgram(self.program)
    }

    pub fn set_uniform(&self, variable: &CStr, uniform: UniformKind) -> GlResult<()> {
        let location = self
            .core
            .glGetUniformLocation(self.program, variable.as_ptr())?;
        uniform.exec(&self.core, location)
    }

    pub fn delete(self) -> GlResult<()> {
        self.core.glDeleteProgram(self.program)
    }
}

impl<F: ColorShader> ShaderProgram<F> {
    pub fn set_color(&self, color: Vec4) -> GlResult<()> {
        self.set_uniform(
            c"color",
            UniformKind::Uniform4f(color.x, color.y, color.z, color.w),
        )
    }
}

impl<F: MvpShader> ShaderProgram<F> {
    pub fn set_mvp(&self, mvp: &Mat4) -> GlResult<()> {
        self.set_uniform(c"mvp", UniformKind::UniformMatrix4fv(1, false, mvp.as_slice()))
    }
}

impl<F: TextureShader> ShaderProgram<F> {
    pub fn set_texture_unit(&self, unit: i32) -> GlResult<()> {
        self.set_uniform(c"tex", UniformKind::Uniform1i(unit))
    }
}
