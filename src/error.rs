use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OpenGL: {0:?}")]
    OpenGL(glcore::GLCoreError),
    #[error("EGL: {0}")]
    Glutin(#[from] glutin::error::Error),
    #[error("cannot connect to the Wayland compositor: {0}")]
    Connect(#[from] wayland_client::ConnectError),
    #[error("Wayland dispatch failed: {0}")]
    Dispatch(#[from] wayland_client::DispatchError),
    #[error("compositor does not provide {0}")]
    MissingGlobal(&'static str),
    #[error("surface: {0}")]
    Surface(String),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("config syntax: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

// GLCoreError carries no std::error::Error impl, so it cannot be a #[source]
impl From<glcore::GLCoreError> for Error {
    fn from(value: glcore::GLCoreError) -> Self {
        Error::OpenGL(value)
    }
}
