//! GPU rendering using wgpu.
//!
//! Headless: frames are drawn offscreen, read back and handed to the host
//! surface as RGBA8 pixels.

pub mod arena;
pub mod context;
pub mod geometry;
pub mod pipelines;
pub mod renderer;
pub mod textures;

pub use arena::{GpuResource, Release, ResourceArena, ResourceId};
pub use context::{GpuContext, GpuError};
pub use renderer::GpuRenderer;
