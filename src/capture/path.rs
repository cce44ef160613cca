//! Free-form path capture
//!
//! Press starts a trace at the press point, every move appends one point and
//! release hashes the trace. Mouse and touch input are handled identically.

use crate::capture::input::types::{InputEvent, Point, PointerSample};
use crate::capture::surface::{InputSurface, SurfaceSubscription, SurfaceUpdate};
use crate::capture::CaptureContext;
use crate::coordinator::state::Notice;
use crate::fingerprint::Fingerprint;
use parking_lot::Mutex as ParkingMutex;
use std::sync::{Arc, Weak};
use uuid::Uuid;

#[derive(Debug, Default)]
struct PathState {
    capturing: bool,
    trace: Vec<Point>,
}

struct PathInner {
    surface: Weak<dyn InputSurface>,
    context: CaptureContext,
    state: ParkingMutex<PathState>,
}

/// Path capture mounted on a surface
///
/// Dropping it releases the surface listener.
pub struct PathCapture {
    id: Uuid,
    inner: Arc<PathInner>,
    _subscription: SurfaceSubscription,
}

impl PathCapture {
    pub fn mount(surface: Arc<dyn InputSurface>, context: CaptureContext) -> Self {
        let inner = Arc::new(PathInner {
            surface: Arc::downgrade(&surface),
            context,
            state: ParkingMutex::new(PathState::default()),
        });

        let handler = inner.clone();
        let subscription =
            SurfaceSubscription::acquire(surface, Arc::new(move |event: &InputEvent| handler.handle(event)));

        let id = Uuid::new_v4();
        tracing::info!("Path capture mounted (id={})", id);
        Self {
            id,
            inner,
            _subscription: subscription,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn begin(&self, sample: &PointerSample) {
        self.inner.begin(sample);
    }

    pub fn extend(&self, sample: &PointerSample) {
        self.inner.extend(sample);
    }

    pub fn end(&self) -> Option<Fingerprint> {
        self.inner.end()
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.state.lock().capturing
    }

    /// Points of the trace in progress
    pub fn trace(&self) -> Vec<Point> {
        self.inner.state.lock().trace.clone()
    }
}

impl PathInner {
    fn handle(&self, event: &InputEvent) {
        match event {
            InputEvent::Press(sample) => self.begin(sample),
            InputEvent::Move(sample) => self.extend(sample),
            InputEvent::Release => {
                self.end();
            }
        }
    }

    /// Map a sample against the surface's bounds at this instant
    fn locate(&self, sample: &PointerSample) -> Option<(Arc<dyn InputSurface>, Point)> {
        let surface = self.surface.upgrade()?;
        let (client_x, client_y) = sample.primary();
        match surface.bounding_box().to_local(client_x, client_y) {
            Some(point) => Some((surface, point)),
            None => {
                tracing::warn!("Dropping pointer sample with non-finite coordinates");
                None
            }
        }
    }

    fn begin(&self, sample: &PointerSample) {
        if !self.context.is_authorized() {
            self.context.notify(Notice::DrawUnauthorized);
            return;
        }
        let Some((surface, point)) = self.locate(sample) else {
            return;
        };

        {
            let mut state = self.state.lock();
            state.capturing = true;
            state.trace.clear();
            state.trace.push(point);
        }

        surface.render(SurfaceUpdate::ClearStroke);
        surface.render(SurfaceUpdate::BeginStroke { point });
        tracing::debug!("Path capture started at ({}, {})", point.x, point.y);
    }

    fn extend(&self, sample: &PointerSample) {
        if !self.state.lock().capturing {
            return;
        }
        let Some((surface, point)) = self.locate(sample) else {
            return;
        };

        {
            let mut state = self.state.lock();
            // A release may have landed while the surface was being queried.
            if !state.capturing {
                return;
            }
            state.trace.push(point);
        }

        surface.render(SurfaceUpdate::StrokeTo { point });
    }

    fn end(&self) -> Option<Fingerprint> {
        let trace = {
            let mut state = self.state.lock();
            if !state.capturing {
                return None;
            }
            state.capturing = false;
            std::mem::take(&mut state.trace)
        };

        let fingerprint = match Fingerprint::of_trace(&trace) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::error!("Failed to hash path trace: {}", e);
                return None;
            }
        };

        tracing::info!("Path captured ({} points): {}", trace.len(), fingerprint);
        self.context.emit(fingerprint.clone());

        if let Some(surface) = self.surface.upgrade() {
            surface.render(SurfaceUpdate::Acknowledge);
        }
        Some(fingerprint)
    }
}
