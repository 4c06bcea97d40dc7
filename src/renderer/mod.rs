//! Render seam
//!
//! Renderers only ever see a `RenderSnapshot`, an owned copy built at the
//! end of a tick, so they can run on another thread without touching live
//! simulation state.

pub mod text;

pub use text::{TextRenderer, render_frame};

use std::io;

use crate::sim::RenderSnapshot;

pub trait Renderer {
    fn draw(&mut self, frame: &RenderSnapshot) -> io::Result<()>;
}
