use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{info, warn};

use crate::error::Error;

pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Decoded RGBA8 pixels, rows ordered bottom to top the way GL expects them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn from_top_down(mut rgba: RgbaImage) -> Image {
        image::imageops::flip_vertical_in_place(&mut rgba);
        Image {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        }
    }

    /// Any PNG color type, expanded to 8 bit RGBA
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Image, Error> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(Self::from_top_down(decoded.to_rgba8()))
    }

    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Image, Error> {
        let path = path.as_ref();
        info!("loading {}", path.display());
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            context: format!("reading {}", path.display()),
            source,
        })?;
        let image = Self::from_png_bytes(&bytes)?;
        info!("{}: {}x{}", path.display(), image.width, image.height);
        Ok(image)
    }

    pub fn checkerboard(size: u32, cells: u32) -> Image {
        let cell = (size / cells.max(1)).max(1);
        let rgba = RgbaImage::from_fn(size, size, |x, y| {
            match (x / cell + y / cell) % 2 == 0 {
                true => image::Rgba([0xd0, 0x90, 0x40, 0xff]),
                false => image::Rgba([0x60, 0x38, 0x18, 0xff]),
            }
        });
        Self::from_top_down(rgba)
    }
}

/// Looks up named resources below a media directory
#[derive(Debug, Clone)]
pub struct Resources {
    media_dir: PathBuf,
}

impl Resources {
    pub fn new<P: Into<PathBuf>>(media_dir: P) -> Resources {
        Resources {
            media_dir: media_dir.into(),
        }
    }

    pub fn path(&self, resource: &str) -> PathBuf {
        self.media_dir.join(resource)
    }

    /// Falls back to a generated checkerboard when the texture cannot be read
    pub fn texture_or_placeholder(&self, resource: &str) -> Image {
        match Image::load_png(self.path(resource)) {
            Ok(image) => image,
            Err(err) => {
                warn!("using a placeholder texture for {resource}: {err}");
                Image::checkerboard(256, 8)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, GrayImage, Luma, Rgba};

    use super::*;

    fn encode(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .expect("PNG encoding");
        bytes.into_inner()
    }

    #[test]
    fn resource_paths_use_media_prefix() {
        assert_eq!(
            Resources::new(DEFAULT_MEDIA_DIR).path("crate.png"),
            PathBuf::from("media/crate.png")
        );
        assert_eq!(
            Resources::new("/opt/demo").path("a/b.png"),
            PathBuf::from("/opt/demo/a/b.png")
        );
    }

    #[test]
    fn rows_are_stored_bottom_up() {
        let mut rgba = RgbaImage::new(1, 2);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        rgba.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let image = Image::from_png_bytes(&encode(DynamicImage::ImageRgba8(rgba))).expect("decode");
        assert_eq!((image.width(), image.height()), (1, 2));
        assert_eq!(image.data(), &[0, 0, 255, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn gray_png_expands_to_opaque_rgba() {
        let gray = GrayImage::from_pixel(2, 1, Luma([0x80]));
        let image = Image::from_png_bytes(&encode(DynamicImage::ImageLuma8(gray))).expect("decode");
        assert_eq!(image.data(), &[0x80, 0x80, 0x80, 0xff, 0x80, 0x80, 0x80, 0xff]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            Image::from_png_bytes(b"definitely not a png"),
            Err(Error::Image(_))
        ));
    }

    #[test]
    fn bundled_crate_texture_decodes() {
        let image = Image::from_png_bytes(include_bytes!("../media/crate.png")).expect("decode");
        assert_eq!((image.width(), image.height()), (128, 128));
    }

    #[test]
    fn missing_texture_falls_back() {
        let resources = Resources::new("/nonexistent/media");
        let image = resources.texture_or_placeholder("crate.png");
        assert_eq!((image.width(), image.height()), (256, 256));
        assert_eq!(image.data().len(), 256 * 256 * 4);
    }
}
