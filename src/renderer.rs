use std::f32::consts::FRAC_PI_4;
use std::num::NonZero;
use std::thread;
use std::time::{Duration, Instant};

use glcore::GLCore;
use log::{debug, info, trace};

use crate::config::{RenderSettings, Scene};
use crate::controls::{self, SharedInteraction};
use crate::error::Error;
use crate::gpu_surface::GpuSurface;
use crate::opengl::highlevel::{ElementsMode, SimpleGL, VertexBuffer};
use crate::opengl::shaders::builtin::{FlatColor, TexturedCube};
use crate::opengl::texture::Texture2D;
use crate::opengl::types::{
    GlResult, Mat4, TexturedVertex, TexturedVertexArray, Vec2, Vec2Array, Vec3, Vec4,
};
use crate::resources::Resources;
use crate::rotation::FrameClock;

const FIELD_OF_VIEW: f32 = FRAC_PI_4;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
const CAMERA_DISTANCE: f32 = 4.0;

const HUE_TURNS_PER_SECOND: f32 = 0.1;
const QUAD_HALF_EXTENT: f32 = 0.5;

const PRESSED_BACKGROUND: Vec4 = Vec4 { x: 1.0, y: 0.0, z: 0.0, w: 1.0 };
const RELEASED_BACKGROUND: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 1.0, w: 1.0 };
const CUBE_BACKGROUND: Vec4 = Vec4 { x: 0.1, y: 0.1, z: 0.12, w: 1.0 };

#[rustfmt::skip]
pub const CUBE_VERTICES: [TexturedVertex; 36] = [
    // front
    TexturedVertex::new(-1.0, -1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0, -1.0,  1.0, 1.0, 0.0),
    TexturedVertex::new( 1.0,  1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0, -1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0,  1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0,  1.0,  1.0, 0.0, 1.0),
    // back
    TexturedVertex::new( 1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new(-1.0, -1.0, -1.0, 1.0, 0.0),
    TexturedVertex::new(-1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new( 1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new(-1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new( 1.0,  1.0, -1.0, 0.0, 1.0),
    // left
    TexturedVertex::new(-1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new(-1.0, -1.0,  1.0, 1.0, 0.0),
    TexturedVertex::new(-1.0,  1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new(-1.0,  1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0,  1.0, -1.0, 0.0, 1.0),
    // right
    TexturedVertex::new( 1.0, -1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0, -1.0, -1.0, 1.0, 0.0),
    TexturedVertex::new( 1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new( 1.0, -1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new( 1.0,  1.0,  1.0, 0.0, 1.0),
    // top
    TexturedVertex::new(-1.0,  1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0,  1.0,  1.0, 1.0, 0.0),
    TexturedVertex::new( 1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0,  1.0,  1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0,  1.0, -1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0,  1.0, -1.0, 0.0, 1.0),
    // bottom
    TexturedVertex::new(-1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0, -1.0, -1.0, 1.0, 0.0),
    TexturedVertex::new( 1.0, -1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0, -1.0, -1.0, 0.0, 0.0),
    TexturedVertex::new( 1.0, -1.0,  1.0, 1.0, 1.0),
    TexturedVertex::new(-1.0, -1.0,  1.0, 0.0, 1.0),
];

/// Model-view-projection for the cube at the given rotation angles
pub fn cube_mvp(aspect: f32, (angle_x, angle_y): (f32, f32)) -> Mat4 {
    let projection = Mat4::perspective(FIELD_OF_VIEW, aspect, NEAR_PLANE, FAR_PLANE);
    let view = Mat4::translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE));
    let model = Mat4::rotation_x(angle_x) * Mat4::rotation_y(angle_y);
    projection * view * model
}

/// Sleeps the render loop onto a fixed period grid
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    period: Duration,
    deadline: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: u32) -> FramePacer {
        FramePacer {
            period: Duration::from_secs(1) / fps.max(1),
            deadline: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// How long to wait at `now` before starting the next frame
    ///
    /// A frame that finished past its deadline starts the next one immediately and the grid is
    /// moved to `now` so missed frames are not made up for.
    pub fn wait(&mut self, now: Instant) -> Duration {
        match self.deadline {
            Some(deadline) if deadline > now => {
                self.deadline = Some(deadline + self.period);
                deadline - now
            }
            Some(deadline) => {
                trace!("frame overran by {:?}", now - deadline);
                self.deadline = Some(now + self.period);
                Duration::ZERO
            }
            None => {
                self.deadline = Some(now + self.period);
                Duration::ZERO
            }
        }
    }
}

/// Checked before drawing, so a limit of 0 renders nothing
fn frame_limit_reached(limit: Option<u64>, rendered: u64) -> bool {
    limit.is_some_and(|limit| rendered >= limit)
}

/// What a frame needs from the shared state, taken under one lock
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameInput {
    quit: bool,
    resize: Option<(NonZero<u32>, NonZero<u32>)>,
    pressed: bool,
    angles: (f32, f32),
}

enum SceneState {
    Quad {
        gl: SimpleGL<FlatColor>,
    },
    Cube {
        gl: SimpleGL<TexturedCube>,
        cube: VertexBuffer,
        texture: Texture2D,
    },
}

impl SceneState {
    fn quad(core: GLCore) -> GlResult<SceneState> {
        let gl = SimpleGL::new(core);
        let program = gl.new_builtin_shader(FlatColor)?.use_program()?;
        Ok(SceneState::Quad {
            gl: gl.with_shader(program),
        })
    }

    fn cube(core: GLCore, resources: &Resources, texture: &str) -> GlResult<SceneState> {
        let gl = SimpleGL::new(core);
        let program = gl.new_builtin_shader(TexturedCube)?.use_program()?;
        let gl = gl.with_shader(program);
        gl.enable_depth_test()?;

        let image = resources.texture_or_placeholder(texture);
        debug!("cube texture is {}x{}", image.width(), image.height());
        let texture = Texture2D::new(core, &image)?;
        let cube = VertexBuffer::textured(core, TexturedVertexArray::new(&CUBE_VERTICES))?;
        Ok(SceneState::Cube { gl, cube, texture })
    }

    fn draw(&self, frame: &FrameInput, aspect: f32, seconds: f32) -> GlResult<()> {
        match self {
            SceneState::Quad { gl } => {
                let background = match frame.pressed {
                    true => PRESSED_BACKGROUND,
                    false => RELEASED_BACKGROUND,
                };
                gl.clear(background)?;

                let half = Vec2::new(QUAD_HALF_EXTENT / aspect.max(f32::EPSILON), QUAD_HALF_EXTENT);
                let corners = [
                    Vec2::new(-1.0, -1.0) * half,
                    Vec2::new(1.0, -1.0) * half,
                    Vec2::new(1.0, 1.0) * half,
                    Vec2::new(-1.0, 1.0) * half,
                ];
                gl.draw_polygon(
                    ElementsMode::TriangleFan,
                    Vec4::from_hue(seconds * HUE_TURNS_PER_SECOND),
                    Vec2Array::new(&corners),
                )
            }
            SceneState::Cube { gl, cube, texture } => {
                gl.clear(CUBE_BACKGROUND)?;
                let mvp = cube_mvp(aspect, frame.angles);
                gl.draw_textured(ElementsMode::Triangles, cube, texture, &mvp)
            }
        }
    }

    fn delete(self) -> GlResult<()> {
        match self {
            SceneState::Quad { gl } => gl.delete_shader(),
            SceneState::Cube { gl, cube, texture } => {
                cube.delete()?;
                texture.delete()?;
                gl.delete_shader()
            }
        }
    }
}

pub struct DemoRenderer {
    scene: SceneState,
    interaction: SharedInteraction,
    clock: FrameClock,
    pacer: FramePacer,
    frame_limit: Option<u64>,
    started: Instant,
}

impl DemoRenderer {
    pub fn new(
        gpu: &GpuSurface,
        settings: &RenderSettings,
        interaction: SharedInteraction,
    ) -> Result<DemoRenderer, Error> {
        let core = gpu.renderer();
        let scene = match settings.scene {
            Scene::Quad => SceneState::quad(core)?,
            Scene::Cube => {
                let resources = Resources::new(&settings.media_dir);
                SceneState::cube(core, &resources, &settings.texture)?
            }
        };
        let pacer = FramePacer::new(settings.fps);
        info!(
            "rendering the {:?} scene every {:?}",
            settings.scene,
            pacer.period()
        );

        Ok(DemoRenderer {
            scene,
            interaction,
            clock: FrameClock::new(),
            pacer,
            frame_limit: settings.frames,
            started: Instant::now(),
        })
    }

    /// Integrates the rotation for the time since the previous frame and snapshots the rest
    fn frame_input(&mut self, now: Instant) -> FrameInput {
        let mut interaction = controls::lock(&self.interaction);
        if let Some(elapsed) = self.clock.tick(now) {
            let rotation = interaction.controls_mut().rotation_mut();
            let was_spinning = rotation.is_spinning();
            rotation.integrate(elapsed);
            if was_spinning && !rotation.is_spinning() {
                debug!(
                    "cube came to rest at ({:.3}, {:.3})",
                    rotation.x().angle(),
                    rotation.y().angle()
                );
            }
        }
        FrameInput {
            quit: interaction.quit_requested(),
            resize: interaction.take_resize(),
            pressed: interaction.controls().is_pressed(),
            angles: interaction.controls().rotation().angles(),
        }
    }

    /// Renders until a quit is requested or the frame limit is reached, returns the frame count
    pub fn run(mut self, gpu: &mut GpuSurface) -> Result<u64, Error> {
        let gl = SimpleGL::new(gpu.renderer());
        if let Some((width, height)) = gpu.size() {
            gl.viewport(width, height)?;
        }

        let mut frames = 0;
        loop {
            if frame_limit_reached(self.frame_limit, frames) {
                info!("rendered the requested {frames} frames");
                break;
            }
            let now = Instant::now();
            let frame = self.frame_input(now);
            if frame.quit {
                info!("quitting after {frames} frames");
                break;
            }
            if let Some((width, height)) = frame.resize {
                gpu.resize(width, height);
                gl.viewport(width.get(), height.get())?;
            }

            let aspect = match gpu.size() {
                Some((width, height)) if height > 0 => width as f32 / height as f32,
                _ => 1.0,
            };
            let seconds = now.duration_since(self.started).as_secs_f32();
            self.scene.draw(&frame, aspect, seconds)?;
            gpu.swap_buffers()?;

            frames += 1;
            thread::sleep(self.pacer.wait(Instant::now()));
        }

        self.scene.delete()?;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opengl::types::AsFloatArray;

    #[test]
    fn pacer_sleeps_to_the_next_deadline() {
        let mut pacer = FramePacer::new(50);
        assert_eq!(pacer.period(), Duration::from_millis(20));

        let start = Instant::now();
        assert_eq!(pacer.wait(start), Duration::ZERO);
        assert_eq!(pacer.wait(start + Duration::from_millis(5)), Duration::from_millis(15));
        // the grid advances by one period regardless of when the frame started
        assert_eq!(pacer.wait(start + Duration::from_millis(30)), Duration::from_millis(10));
    }

    #[test]
    fn pacer_rebases_after_overrun() {
        let mut pacer = FramePacer::new(50);
        let start = Instant::now();
        pacer.wait(start);

        let late = start + Duration::from_millis(75);
        assert_eq!(pacer.wait(late), Duration::ZERO);
        assert_eq!(pacer.wait(late + Duration::from_millis(4)), Duration::from_millis(16));
    }

    #[test]
    fn frame_limit_is_checked_before_drawing() {
        assert!(frame_limit_reached(Some(0), 0));
        assert!(!frame_limit_reached(Some(2), 1));
        assert!(frame_limit_reached(Some(2), 2));
        assert!(!frame_limit_reached(None, u64::MAX));
    }

    #[test]
    fn zero_fps_does_not_divide_by_zero() {
        assert_eq!(FramePacer::new(0).period(), Duration::from_secs(1));
    }

    #[test]
    fn cube_is_six_quads_on_the_unit_box() {
        for face in CUBE_VERTICES.chunks(6) {
            let axis_fixed = [
                face.iter().all(|v| v.position.x == face[0].position.x),
                face.iter().all(|v| v.position.y == face[0].position.y),
                face.iter().all(|v| v.position.z == face[0].position.z),
            ];
            assert_eq!(axis_fixed.iter().filter(|fixed| **fixed).count(), 1);
        }
        for vertex in CUBE_VERTICES {
            let p = vertex.position;
            assert!([p.x, p.y, p.z].iter().all(|c| c.abs() == 1.0));
            assert!((0.0..=1.0).contains(&vertex.uv.x));
            assert!((0.0..=1.0).contains(&vertex.uv.y));
        }
        let floats = TexturedVertexArray::new(&CUBE_VERTICES)
            .as_contiguous_block()
            .map(<[f32]>::len);
        assert_eq!(floats, Some(36 * 5));
    }

    #[test]
    fn unrotated_cube_faces_the_camera() {
        let mvp = cube_mvp(16.0 / 9.0, (0.0, 0.0));
        let front = mvp.transform(Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert!((front.x / front.w).abs() < 1e-5);
        assert!((front.y / front.w).abs() < 1e-5);
        let depth = front.z / front.w;
        assert!(depth > -1.0 && depth < 1.0);

        let back = mvp.transform(Vec4::new(0.0, 0.0, -1.0, 1.0));
        assert!(back.z / back.w > depth);
    }

    #[test]
    fn spinning_cube_stays_between_the_clip_planes() {
        for step in 0..16 {
            let angle = step as f32 * 0.4;
            let mvp = cube_mvp(1.0, (angle, -angle));
            for vertex in CUBE_VERTICES {
                let p = vertex.position;
                let clip = mvp.transform(Vec4::new(p.x, p.y, p.z, 1.0));
                assert!(clip.w > 0.0);
                assert!((clip.z / clip.w).abs() < 1.0);
            }
        }
    }
}
