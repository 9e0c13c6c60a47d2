pub mod highlevel;
pub mod shaders;
pub mod texture;
pub mod types;
