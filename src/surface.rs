use std::num::NonZero;

use log::{debug, info, warn};
use wayland_client::{
    self, Connection, Dispatch, QueueHandle, protocol::wl_output::WlOutput,
    protocol::wl_surface::WlSurface,
};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::Layer,
    zwlr_layer_surface_v1::{self, Anchor, KeyboardInteractivity, ZwlrLayerSurfaceV1},
};

use crate::config::Shell;
use crate::controls;
use crate::error::Error;
use crate::state::WaylandState;

const SURFACE_NAMESPACE: &str = "spincube";

/// Used when the compositor leaves the size up to us
pub const FALLBACK_SIZE: Sizes = Sizes {
    width: NonZero::new(640).unwrap(),
    height: NonZero::new(480).unwrap(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizes {
    pub width: NonZero<u32>,
    pub height: NonZero<u32>,
}

impl Sizes {
    /// `None` when the compositor left either dimension to the client
    pub fn from_configure(width: i64, height: i64) -> Option<Sizes> {
        let width = NonZero::new(u32::try_from(width).ok()?)?;
        let height = NonZero::new(u32::try_from(height).ok()?)?;
        Some(Sizes { width, height })
    }
}

#[derive(Debug)]
enum ShellSurface {
    Xdg {
        xdg_surface: XdgSurface,
        toplevel: XdgToplevel,
    },
    Layer(ZwlrLayerSurfaceV1),
}

#[derive(Debug)]
pub struct Surface {
    wayland_surface: WlSurface,
    shell: ShellSurface,
    pending_size: Option<Sizes>,
    size: Option<Sizes>,
    configured: bool,
}

impl Surface {
    /// Requests a fullscreen surface on `output`, or wherever the compositor likes without one
    pub fn create(
        shell: Shell,
        output: Option<&WlOutput>,
        state: &WaylandState,
        queue_handle: &QueueHandle<WaylandState>,
    ) -> Result<Surface, Error> {
        let protocols = &state.protocols;
        let wayland_surface = protocols
            .compositor
            .as_ref()
            .ok_or(Error::MissingGlobal("wl_compositor"))?
            .create_surface(queue_handle, ());

        let shell = match shell {
            Shell::Xdg => {
                let wm_base = protocols
                    .wm_base
                    .as_ref()
                    .ok_or(Error::MissingGlobal("xdg_wm_base"))?;
                let xdg_surface = wm_base.get_xdg_surface(&wayland_surface, queue_handle, ());
                let toplevel = xdg_surface.get_toplevel(queue_handle, ());
                toplevel.set_title(SURFACE_NAMESPACE.into());
                toplevel.set_app_id(SURFACE_NAMESPACE.into());
                toplevel.set_fullscreen(output);
                ShellSurface::Xdg {
                    xdg_surface,
                    toplevel,
                }
            }
            Shell::Layer => {
                let layer_shell = protocols
                    .layer
                    .as_ref()
                    .ok_or(Error::MissingGlobal("zwlr_layer_shell_v1"))?;
                let layer_surface = layer_shell.get_layer_surface(
                    &wayland_surface,
                    output,
                    Layer::Overlay,
                    SURFACE_NAMESPACE.into(),
                    queue_handle,
                    (),
                );
                layer_surface.set_anchor(Anchor::Top | Anchor::Bottom | Anchor::Left | Anchor::Right);
                layer_surface.set_exclusive_zone(-1);
                layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
                layer_surface.set_size(0, 0);
                ShellSurface::Layer(layer_surface)
            }
        };
        wayland_surface.commit();

        Ok(Surface {
            wayland_surface,
            shell,
            pending_size: None,
            size: None,
            configured: false,
        })
    }

    pub fn wayland_surface(&self) -> &WlSurface {
        &self.wayland_surface
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn size(&self) -> Option<Sizes> {
        self.size
    }

    fn apply_configure(&mut self, sizes: Option<Sizes>, interaction: &controls::SharedInteraction) {
        let sizes = sizes.or(self.size).unwrap_or(FALLBACK_SIZE);
        if self.size != Some(sizes) {
            info!("surface configured to {}x{}", sizes.width, sizes.height);
            if self.configured {
                controls::lock(interaction).request_resize(sizes.width, sizes.height);
            }
            self.size = Some(sizes);
        }
        self.configured = true;
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        match &self.shell {
            ShellSurface::Xdg {
                xdg_surface,
                toplevel,
            } => {
                toplevel.destroy();
                xdg_surface.destroy();
            }
            ShellSurface::Layer(layer_surface) => layer_surface.destroy(),
        }
        self.wayland_surface.destroy();
    }
}

impl Dispatch<XdgWmBase, ()> for WaylandState {
    fn event(
        _state: &mut Self,
        proxy: &XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            proxy.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        proxy: &XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            proxy.ack_configure(serial);
            if let Some(surface) = state.surface.as_mut() {
                let pending = surface.pending_size.take();
                surface.apply_configure(pending, &state.interaction);
            }
        }
    }
}

impl Dispatch<XdgToplevel, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                if let Some(surface) = state.surface.as_mut() {
                    surface.pending_size = Sizes::from_configure(width.into(), height.into());
                }
            }
            xdg_toplevel::Event::Close => {
                info!("compositor asked us to close");
                controls::lock(&state.interaction).request_quit();
            }
            _ => debug!("unhandled toplevel event"),
        }
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        proxy: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                proxy.ack_configure(serial);
                if let Some(surface) = state.surface.as_mut() {
                    surface.apply_configure(
                        Sizes::from_configure(width.into(), height.into()),
                        &state.interaction,
                    );
                }
            }
            zwlr_layer_surface_v1::Event::Closed => {
                warn!("layer surface closed by the compositor");
                controls::lock(&state.interaction).request_quit();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_negative_configure_means_client_choice() {
        assert_eq!(Sizes::from_configure(0, 600), None);
        assert_eq!(Sizes::from_configure(800, 0), None);
        assert_eq!(Sizes::from_configure(-1, 600), None);

        let sizes = Sizes::from_configure(1920, 1080).expect("valid size");
        assert_eq!((sizes.width.get(), sizes.height.get()), (1920, 1080));
    }

    #[test]
    fn fallback_size_is_nonzero() {
        assert_eq!(FALLBACK_SIZE.width.get(), 640);
        assert_eq!(FALLBACK_SIZE.height.get(), 480);
    }
}
