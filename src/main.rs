use std::thread;

use clap::Parser;
use log::{error, info};
use wayland_client::{Connection, EventQueue};

use crate::config::{Args, Config};
use crate::controls::{CubeControls, Interaction};
use crate::error::Error;
use crate::gpu_surface::{GlAbstraction, GpuSurface};
use crate::renderer::DemoRenderer;
use crate::state::WaylandState;
use crate::surface::{FALLBACK_SIZE, Surface};

mod config;
mod controls;
mod error;
mod gpu_surface;
mod input;
mod opengl;
mod renderer;
mod resources;
mod rotation;
mod state;
mod surface;

/// Keeps dispatching compositor events while the main thread renders
fn spawn_event_thread(
    mut event_queue: EventQueue<WaylandState>,
    mut wayland_state: WaylandState,
) -> Result<thread::JoinHandle<()>, Error> {
    thread::Builder::new()
        .name("wayland-events".into())
        .spawn(move || {
            loop {
                if let Err(err) = wayland_state.handle_events(&mut event_queue) {
                    error!("lost the compositor connection: {err}");
                    controls::lock(&wayland_state.interaction).request_quit();
                    break;
                }
            }
        })
        .map_err(|source| Error::Io {
            context: "spawning the event thread".into(),
            source,
        })
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();
    let config = Config::load(&args)?;

    let connection = Connection::connect_to_env()?;
    let display = connection.display();
    let mut event_queue = connection.new_event_queue();
    let queue_handle = event_queue.handle();

    display.get_registry(&queue_handle, ());

    let interaction = controls::share(Interaction::new(CubeControls::new(
        config.gesture,
        config.rotation,
    )));
    let mut wayland_state = WaylandState::new(interaction.clone());
    event_queue.roundtrip(&mut wayland_state)?;
    // Output modes and seat capabilities arrive after binding
    event_queue.roundtrip(&mut wayland_state)?;
    wayland_state.log_outputs();

    let output = wayland_state
        .preferred_output()
        .map(|info| info.output.clone());
    let surface = Surface::create(
        config.render.shell,
        output.as_ref(),
        &wayland_state,
        &queue_handle,
    )?;
    wayland_state.surface = Some(surface);

    while !wayland_state
        .surface
        .as_ref()
        .is_some_and(Surface::is_configured)
    {
        wayland_state.handle_events(&mut event_queue)?;
        if controls::lock(&interaction).quit_requested() {
            info!("closed before the first configure");
            return Ok(());
        }
    }

    let surface = wayland_state
        .surface
        .as_ref()
        .ok_or_else(|| Error::Surface("surface disappeared during configure".into()))?;
    let sizes = surface.size().unwrap_or(FALLBACK_SIZE);
    let abstraction = GlAbstraction::new(&display)?;
    let mut gpu = GpuSurface::new(
        &abstraction,
        surface.wayland_surface(),
        sizes.width,
        sizes.height,
    )?;
    let renderer = DemoRenderer::new(&gpu, &config.render, interaction.clone())?;

    spawn_event_thread(event_queue, wayland_state)?;
    let frames = renderer.run(&mut gpu)?;
    info!("done after {frames} frames");
    Ok(())
}
