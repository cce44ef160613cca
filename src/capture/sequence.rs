//! Click-sequence capture
//!
//! N targets are scattered over the surface. The user activates each of them
//! once, in any order; the order of activation is the trace. Target positions
//! never enter the fingerprint.

use crate::capture::input::types::{InputEvent, Point, PointerSample, SurfaceRect};
use crate::capture::surface::{InputSurface, SurfaceSubscription, SurfaceUpdate};
use crate::capture::CaptureContext;
use crate::coordinator::state::Notice;
use crate::fingerprint::Fingerprint;
use parking_lot::Mutex as ParkingMutex;
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// An activation target, positioned by its top-left corner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub index: usize,
    pub left: f64,
    pub top: f64,
    pub size: f64,
    pub activated: bool,
}

impl Target {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.size
            && point.y >= self.top
            && point.y <= self.top + self.size
    }
}

/// Scatter `count` targets uniformly so each lies entirely inside `bounds`
///
/// Targets larger than the container are shrunk to fit it.
pub fn place_targets<R: Rng + ?Sized>(
    count: usize,
    size: f64,
    bounds: SurfaceRect,
    rng: &mut R,
) -> Vec<Target> {
    let size = size.min(bounds.width).min(bounds.height).max(0.0);
    let max_left = (bounds.width - size).max(0.0);
    let max_top = (bounds.height - size).max(0.0);

    (0..count)
        .map(|index| Target {
            index,
            left: sample_offset(rng, max_left),
            top: sample_offset(rng, max_top),
            size,
            activated: false,
        })
        .collect()
}

fn sample_offset<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..=max)
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
struct SequenceState {
    targets: Vec<Target>,
    sequence: Vec<usize>,
    fingerprint: Option<Fingerprint>,
}

struct SequenceInner {
    surface: Weak<dyn InputSurface>,
    context: CaptureContext,
    target_size: f64,
    state: ParkingMutex<SequenceState>,
}

/// Sequence capture mounted on a surface
///
/// Dropping it releases the surface listener and clears the targets.
pub struct SequenceCapture {
    id: Uuid,
    inner: Arc<SequenceInner>,
    _subscription: SurfaceSubscription,
}

impl SequenceCapture {
    /// Mount and place `count` targets of `target_size` pixels
    pub fn mount(
        surface: Arc<dyn InputSurface>,
        context: CaptureContext,
        count: usize,
        target_size: f64,
    ) -> Self {
        Self::mount_with_rng(surface, context, count, target_size, &mut rand::thread_rng())
    }

    pub fn mount_with_rng<R: Rng + ?Sized>(
        surface: Arc<dyn InputSurface>,
        context: CaptureContext,
        count: usize,
        target_size: f64,
        rng: &mut R,
    ) -> Self {
        let inner = Arc::new(SequenceInner {
            surface: Arc::downgrade(&surface),
            context,
            target_size,
            state: ParkingMutex::new(SequenceState::default()),
        });

        let handler = inner.clone();
        let subscription = SurfaceSubscription::acquire(
            surface,
            Arc::new(move |event: &InputEvent| handler.handle(event)),
        );

        let id = Uuid::new_v4();
        tracing::info!("Sequence capture mounted (id={}, targets={})", id, count);

        let capture = Self {
            id,
            inner,
            _subscription: subscription,
        };
        capture.setup_with_rng(count, rng);
        capture
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Scatter `count` fresh targets and forget any previous activations
    pub fn setup(&self, count: usize) {
        self.setup_with_rng(count, &mut rand::thread_rng());
    }

    pub fn setup_with_rng<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) {
        self.inner.setup(count, rng);
    }

    pub fn activate(&self, index: usize) -> Option<Fingerprint> {
        self.inner.activate(index)
    }

    pub fn targets(&self) -> Vec<Target> {
        self.inner.state.lock().targets.clone()
    }

    /// Indices activated so far, in click order
    pub fn sequence(&self) -> Vec<usize> {
        self.inner.state.lock().sequence.clone()
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.inner.state.lock().fingerprint.clone()
    }
}

impl SequenceInner {
    fn handle(&self, event: &InputEvent) {
        if let InputEvent::Press(sample) = event {
            if let Some(index) = self.hit_test(sample) {
                self.activate(index);
            }
        }
    }

    /// Topmost target under the press; later targets sit above earlier ones
    fn hit_test(&self, sample: &PointerSample) -> Option<usize> {
        let surface = self.surface.upgrade()?;
        let (client_x, client_y) = sample.primary();
        let point = surface.bounding_box().to_local(client_x, client_y)?;
        self.state
            .lock()
            .targets
            .iter()
            .rev()
            .find(|target| target.contains(point))
            .map(|target| target.index)
    }

    fn setup<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) {
        let Some(surface) = self.surface.upgrade() else {
            return;
        };

        if !self.context.is_authorized() {
            tracing::debug!("Wallet not connected, no targets placed");
            let had_targets = {
                let mut state = self.state.lock();
                let had_targets = !state.targets.is_empty();
                *state = SequenceState::default();
                had_targets
            };
            if had_targets {
                surface.render(SurfaceUpdate::Clear);
            }
            return;
        }

        let targets = place_targets(count, self.target_size, surface.bounding_box(), rng);
        {
            let mut state = self.state.lock();
            state.targets = targets.clone();
            state.sequence.clear();
            state.fingerprint = None;
        }

        surface.render(SurfaceUpdate::PlaceTargets { targets });
    }

    fn activate(&self, index: usize) -> Option<Fingerprint> {
        if !self.context.is_authorized() {
            self.context.notify(Notice::ClickUnauthorized);
            return None;
        }

        let completed = {
            let mut state = self.state.lock();
            let Some(target) = state.targets.get_mut(index) else {
                tracing::debug!("Ignoring activation of unknown target {}", index);
                return None;
            };
            if target.activated {
                return None;
            }
            target.activated = true;
            state.sequence.push(index);
            tracing::debug!("Activation sequence: {:?}", state.sequence);

            if state.sequence.len() == state.targets.len() {
                Some(state.sequence.clone())
            } else {
                None
            }
        };

        if let Some(surface) = self.surface.upgrade() {
            surface.render(SurfaceUpdate::TargetActivated { index });
        }

        let sequence = completed?;
        let fingerprint = match Fingerprint::of_trace(&sequence) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::error!("Failed to hash activation sequence: {}", e);
                return None;
            }
        };

        tracing::info!("Sequence captured {:?}: {}", sequence, fingerprint);
        self.state.lock().fingerprint = Some(fingerprint.clone());
        self.context.emit(fingerprint.clone());
        Some(fingerprint)
    }
}
