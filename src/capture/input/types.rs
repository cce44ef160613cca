use crate::fingerprint::serialize_js_number;
use serde::{Deserialize, Serialize};

/// Surface-local position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(serialize_with = "serialize_js_number")]
    pub x: f64,
    #[serde(serialize_with = "serialize_js_number")]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One contact of a touch event, viewport-relative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    pub client_x: f64,
    pub client_y: f64,
}

/// Pointer position as reported by the host, viewport-relative
///
/// Mouse events carry only `client_x`/`client_y`; touch events also carry
/// their contact list, of which only the first entry is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    #[serde(default)]
    pub client_x: f64,
    #[serde(default)]
    pub client_y: f64,
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
}

impl PointerSample {
    pub fn mouse(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            touches: Vec::new(),
        }
    }

    pub fn touch(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x: 0.0,
            client_y: 0.0,
            touches: vec![TouchPoint { client_x, client_y }],
        }
    }

    /// Viewport position of the primary contact
    pub fn primary(&self) -> (f64, f64) {
        match self.touches.first() {
            Some(touch) => (touch.client_x, touch.client_y),
            None => (self.client_x, self.client_y),
        }
    }
}

/// Raw input delivered by an input surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InputEvent {
    /// Mouse down / touch start
    Press(PointerSample),
    /// Mouse move / touch move
    Move(PointerSample),
    /// Mouse up / touch end
    Release,
}

/// Viewport-relative bounding box of a capture surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Translate a viewport position into surface-local coordinates
    ///
    /// Returns `None` for non-finite input. The result is clamped to the
    /// surface so a drag that leaves the surface stays on its edge.
    pub fn to_local(&self, client_x: f64, client_y: f64) -> Option<Point> {
        if !client_x.is_finite() || !client_y.is_finite() {
            return None;
        }
        let x = (client_x - self.left).clamp(0.0, self.width.max(0.0));
        let y = (client_y - self.top).clamp(0.0, self.height.max(0.0));
        Some(Point::new(x, y))
    }
}
