//! Inkmark Render Library
//!
//! Pen-style ink rendering. Strokes become backend-neutral [`DrawCommand`]s,
//! which a backend such as [`RasterBackend`] then paints.

mod command;
mod live;
mod raster;
mod renderer;
mod rng;
pub mod spline;
pub mod styles;

pub use command::{DrawCommand, LineCap};
pub use live::{LIVE_TAIL_POINTS, render_live_tail};
pub use raster::{RasterBackend, to_skia_path, to_skia_transform};
pub use renderer::{InkBackend, RenderResult, RendererError, render_page, render_stroke, render_stroke_seeded};
pub use rng::SimpleRng;
pub use styles::Ink;
