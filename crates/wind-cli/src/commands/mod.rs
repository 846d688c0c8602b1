pub mod play;
pub mod render;
pub mod write;
