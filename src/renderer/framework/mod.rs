//! Graphics abstraction the renderer is written against.
//!
//! All GPU access goes through the [`server::GraphicsServer`] trait and the
//! trait-object resources it creates. A backend wrapping a real GPU API is an
//! external concern; the [`headless::HeadlessGraphicsServer`] here implements
//! the same interface with bookkeeping only.

pub mod error;
pub mod framebuffer;
pub mod geometry_buffer;
pub mod gpu_program;
pub mod gpu_texture;
pub mod headless;
pub mod server;
