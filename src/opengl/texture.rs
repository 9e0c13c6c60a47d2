use std::ffi::c_void;

use glcore::{GL_1_0_g, GL_1_1_g, GL_1_3_g, GLCore, GLCoreError};

use super::types::GlResult;
use crate::resources::Image;

#[derive(Debug)]
pub struct Texture2D {
    texture: u32,
    core: GLCore,
}

impl Texture2D {
    /// Uploads RGBA8 pixels whose rows are already ordered bottom to top
    pub fn new(core: GLCore, image: &Image) -> GlResult<Texture2D> {
        let expected = image.width() as usize * image.height() as usize * 4;
        if image.data().len() != expected {
            return Err(GLCoreError::InvalidValue(
                "Texture data does not match its dimensions",
            ));
        }

        let mut texture = 0;
        core.glGenTextures(1, &mut texture)?;
        core.glBindTexture(glcore::GL_TEXTURE_2D, texture)?;
        core.glPixelStorei(glcore::GL_UNPACK_ALIGNMENT, 1)?;
        core.glTexImage2D(
            glcore::GL_TEXTURE_2D,
            0,
            glcore::GL_RGBA as i32,
            image.width() as i32,
            image.height() as i32,
            0,
            glcore::GL_RGBA,
            glcore::GL_UNSIGNED_BYTE,
            image.data().as_ptr() as *const c_void,
        )?;
        core.glTexParameteri(
            glcore::GL_TEXTURE_2D,
            glcore::GL_TEXTURE_MIN_FILTER,
            glcore::GL_LINEAR as i32,
        )?;
        core.glTexParameteri(
            glcore::GL_TEXTURE_2D,
            glcore::GL_TEXTURE_MAG_FILTER,
            glcore::GL_LINEAR as i32,
        )?;
        core.glTexParameteri(
            glcore::GL_TEXTURE_2D,
            glcore::GL_TEXTURE_WRAP_S,
            glcore::GL_CLAMP_TO_EDGE as i32,
        )?;
        core.glTexParameteri(
            glcore::GL_TEXTURE_2D,
            glcore::GL_TEXTURE_WRAP_T,
            glcore::GL_CLAMP_TO_EDGE as i32,
        )?;

        Ok(Texture2D { texture, core })
    }

    pub fn bind(&self, unit: u32) -> GlResult<()> {
        self.core.glActiveTexture(glcore::GL_TEXTURE0 + unit)?;
        self.core.glBindTexture(glcore::GL_TEXTURE_2D, self.texture)
    }

    pub fn delete(self) -> GlResult<()> {
        self.core.glDeleteTextures(1, [self.texture].as_ptr())
    }
}
