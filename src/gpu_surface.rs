use glcore::GLCore;
use glutin::config::{Api, Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::error::{Error as GlutError, ErrorKind as GlutErrorKind};
use glutin::prelude::{GlDisplay, NotCurrentGlContext};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, WindowSurface};
use log::{debug, info};
use raw_window_handle::{HasDisplayHandle, RawWindowHandle, WaylandWindowHandle};
use std::ffi::{CString, c_void};
use std::num::NonZero;
use std::ptr::NonNull;
use wayland_client::Proxy;
use wayland_client::protocol::wl_display::WlDisplay;
use wayland_client::protocol::wl_surface::WlSurface;

use crate::error::Error;

/// EGL display bound to the Wayland connection
#[derive(Debug, Clone)]
pub struct GlAbstraction {
    display: Display,
    config: Config,
}

impl GlAbstraction {
    pub fn new(wl_display: &WlDisplay) -> Result<Self, Error> {
        let backend = wl_display
            .backend()
            .upgrade()
            .ok_or(GlutError::from(GlutErrorKind::BadDisplay))?;
        let raw_display_handle = backend
            .display_handle()
            .map_err(|_| GlutError::from(GlutErrorKind::BadDisplay))?
            .as_raw();
        let display = unsafe { Display::new(raw_display_handle, DisplayApiPreference::Egl) }?;
        info!("EGL {}", display.version_string());

        let config = Self::pick_config(&display)?;
        debug!(
            "EGL config: {} samples, depth {}",
            config.num_samples(),
            config.depth_size()
        );
        Ok(GlAbstraction { display, config })
    }

    fn pick_config(display: &Display) -> Result<Config, GlutError> {
        let config_template = ConfigTemplateBuilder::new()
            .with_buffer_type(glutin::config::ColorBufferType::Rgb {
                r_size: 8,
                g_size: 8,
                b_size: 8,
            })
            .with_depth_size(16)
            .with_api(Api::GLES3)
            .build();
        unsafe { display.find_configs(config_template) }?
            .reduce(
                |config, best| match config.num_samples() > best.num_samples() {
                    true => config,
                    false => best,
                },
            )
            .ok_or(GlutError::from(GlutErrorKind::BadConfig))
    }

    fn window_handle(surface: &WlSurface) -> Result<RawWindowHandle, GlutError> {
        let surface_ptr = NonNull::new(surface.id().as_ptr() as *mut c_void)
            .ok_or(GlutError::from(GlutErrorKind::BadNativeWindow))?;
        Ok(RawWindowHandle::Wayland(WaylandWindowHandle::new(
            surface_ptr,
        )))
    }
}

/// An EGL window surface with its context made current on the calling thread
pub struct GpuSurface {
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    renderer: GLCore,
}

impl GpuSurface {
    pub fn new(
        abstraction: &GlAbstraction,
        surface: &WlSurface,
        width: NonZero<u32>,
        height: NonZero<u32>,
    ) -> Result<GpuSurface, Error> {
        let raw_window_handle = GlAbstraction::window_handle(surface)?;

        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(Some(raw_window_handle));
        let not_current = unsafe {
            abstraction
                .display
                .create_context(&abstraction.config, &context_attrs)
        }?;

        let surface_attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            width,
            height,
        );
        let surface = unsafe {
            abstraction
                .display
                .create_window_surface(&abstraction.config, &surface_attrs)
        }?;
        let context = not_current.make_current(&surface)?;

        let renderer = GLCore::new(|fn_name| {
            match CString::new(fn_name) {
                Ok(c_str) => abstraction.display.get_proc_address(&c_str),
                Err(_) => std::ptr::null(),
            }
        })
        .map_err(|_| GlutError::from(GlutErrorKind::BadContext))?;
        info!("GL surface {width}x{height} ready");

        Ok(GpuSurface {
            context,
            surface,
            renderer,
        })
    }

    pub fn resize(&mut self, width: NonZero<u32>, height: NonZero<u32>) {
        debug!("resizing GL surface to {width}x{height}");
        self.surface.resize(&self.context, width, height);
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        Some((self.surface.width()?, self.surface.height()?))
    }

    pub fn swap_buffers(&mut self) -> Result<(), GlutError> {
        self.surface.swap_buffers(&self.context)
    }

    pub fn renderer(&self) -> GLCore {
        self.renderer
    }
}
