use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::Error;
use crate::input::SwipeSettings;
use crate::resources::DEFAULT_MEDIA_DIR;
use crate::rotation::RotationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    /// Clear color follows the contact, quad color cycles
    Quad,
    /// Textured cube rotated by drags and swipes
    #[default]
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    /// Fullscreen xdg toplevel
    #[default]
    Xdg,
    /// wlr layer-shell overlay covering the output
    Layer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub scene: Scene,
    pub shell: Shell,
    pub fps: u32,
    /// Stop after this many frames
    pub frames: Option<u64>,
    pub media_dir: PathBuf,
    pub texture: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            shell: Shell::default(),
            fps: 60,
            frames: None,
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            texture: "crate.png".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub gesture: SwipeSettings,
    pub rotation: RotationSettings,
    pub render: RenderSettings,
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Config, Error> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            context: format!("reading config {}", path.display()),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Loads the config file, if any, and lets the command line override it
    pub fn load(args: &Args) -> Result<Config, Error> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        args.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.render.fps == 0 {
            return Err(Error::Config("render.fps must be positive".into()));
        }
        let finite = [
            ("gesture.min_length_squared", self.gesture.min_length_squared),
            ("rotation.drag_divisor_x", self.rotation.drag_divisor_x),
            ("rotation.drag_divisor_y", self.rotation.drag_divisor_y),
            ("rotation.impulse_divisor", self.rotation.impulse_divisor),
            ("rotation.deceleration", self.rotation.deceleration),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::Config(format!("{name} must be a finite number")));
        }
        if self.rotation.drag_divisor_x == 0.0
            || self.rotation.drag_divisor_y == 0.0
            || self.rotation.impulse_divisor == 0.0
        {
            return Err(Error::Config("rotation divisors cannot be zero".into()));
        }
        if self.rotation.deceleration < 0.0 {
            return Err(Error::Config("rotation.deceleration cannot be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Parser)]
#[command(version, about = "Fullscreen OpenGL ES demo with a touch driven spinning cube")]
pub struct Args {
    /// TOML file with [gesture], [rotation] and [render] sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub scene: Option<Scene>,

    #[arg(long, value_enum)]
    pub shell: Option<Shell>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Exit after rendering this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Directory holding textures
    #[arg(long)]
    pub media_dir: Option<PathBuf>,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(scene) = self.scene {
            config.render.scene = scene;
        }
        if let Some(shell) = self.shell {
            config.render.shell = shell;
        }
        if let Some(fps) = self.fps {
            config.render.fps = fps;
        }
        if let Some(frames) = self.frames {
            config.render.frames = Some(frames);
        }
        if let Some(media_dir) = &self.media_dir {
            config.render.media_dir = media_dir.clone();
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_feel() {
        let config = Config::default();
        assert_eq!(config.gesture.max_duration_ms, 200);
        assert_eq!(config.gesture.min_length_squared, 300.0);
        assert_eq!(config.rotation.drag_divisor_x, 500.0);
        assert_eq!(config.rotation.drag_divisor_y, 400.0);
        assert_eq!(config.rotation.impulse_divisor, 100.0);
        assert_eq!(config.rotation.deceleration, 2.0);
        assert_eq!(config.render.fps, 60);
        assert_eq!(config.render.scene, Scene::Cube);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [gesture]
            max_duration_ms = 250

            [render]
            scene = "quad"
            shell = "layer"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.gesture.max_duration_ms, 250);
        assert_eq!(config.gesture.min_length_squared, 300.0);
        assert_eq!(config.rotation, RotationSettings::default());
        assert_eq!(config.render.scene, Scene::Quad);
        assert_eq!(config.render.shell, Shell::Layer);
        assert_eq!(config.render.texture, "crate.png");
    }

    #[test]
    fn sample_config_spells_out_defaults() {
        let config = Config::from_toml(include_str!("../spincube.toml")).expect("valid config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[rotation]\nfriction = 1.0\n").is_err());
        assert!(Config::from_toml("[physics]\n").is_err());
    }

    #[test]
    fn command_line_overrides_file() {
        let mut config = Config::from_toml("[render]\nfps = 30\n").expect("valid config");
        let args = Args::parse_from(["spincube", "--fps", "90", "--scene", "quad", "--frames", "10"]);
        args.apply(&mut config);

        assert_eq!(config.render.fps, 90);
        assert_eq!(config.render.scene, Scene::Quad);
        assert_eq!(config.render.frames, Some(10));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = Config::default();
        config.render.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rotation.drag_divisor_y = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_values_fail_validation() {
        let config = Config::from_toml("[rotation]\ndeceleration = nan\n").expect("valid toml");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::from_toml("[gesture]\nmin_length_squared = inf\n").expect("valid toml");
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rotation.drag_divisor_x = f32::NEG_INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(Args::parse_from(["spincube"]).log_filter(), "info");
        assert_eq!(Args::parse_from(["spincube", "-v"]).log_filter(), "debug");
        assert_eq!(Args::parse_from(["spincube", "-vvv"]).log_filter(), "trace");
    }
}
