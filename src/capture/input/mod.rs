//! Input primitives shared by the capture components
//!
//! Viewport-relative pointer samples come in from the host; surface-local
//! points come out.

pub mod types;

pub use types::{InputEvent, Point, PointerSample, SurfaceRect, TouchPoint};
