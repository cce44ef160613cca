//! Input surface capability
//!
//! A capture component never touches the host's widgets directly. It gets an
//! [`InputSurface`] that reports its bounding box, delivers press/move/release
//! events to subscribed listeners and accepts render updates. Subscriptions are
//! held through [`SurfaceSubscription`], which unsubscribes and clears the
//! surface when dropped.

use crate::capture::input::types::{InputEvent, Point, SurfaceRect};
use crate::capture::sequence::Target;
use parking_lot::Mutex as ParkingMutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Out-of-order events held back before the sequence skips the gap
const MAX_HELD_EVENTS: usize = 64;

/// Callback invoked for every input event on a surface
pub type InputListener = Arc<dyn Fn(&InputEvent) + Send + Sync>;

/// Callback that forwards render updates to whatever draws the surface
pub type RenderSink = Box<dyn Fn(&SurfaceUpdate) + Send + Sync>;

/// Handle returned by [`InputSurface::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Visual changes requested by the capture components
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SurfaceUpdate {
    /// Erase the current stroke
    ClearStroke,
    /// Start a new stroke at a point
    BeginStroke { point: Point },
    /// Extend the current stroke to a point
    StrokeTo { point: Point },
    /// Cosmetic confirmation that a gesture was captured
    Acknowledge,
    /// Replace all targets (also resets their activated look)
    PlaceTargets { targets: Vec<Target> },
    /// Show a target as activated
    TargetActivated { index: usize },
    /// Remove everything drawn by the capture component
    Clear,
}

/// Something a capture component can listen to and draw on
pub trait InputSurface: Send + Sync {
    /// Current viewport-relative bounds; may change between events
    fn bounding_box(&self) -> SurfaceRect;

    fn subscribe(&self, listener: InputListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);

    fn render(&self, update: SurfaceUpdate);
}

/// Scoped listener registration on a surface
pub struct SurfaceSubscription {
    surface: Arc<dyn InputSurface>,
    id: ListenerId,
}

impl SurfaceSubscription {
    pub fn acquire(surface: Arc<dyn InputSurface>, listener: InputListener) -> Self {
        let id = surface.subscribe(listener);
        Self { surface, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for SurfaceSubscription {
    fn drop(&mut self) {
        self.surface.unsubscribe(self.id);
        self.surface.render(SurfaceUpdate::Clear);
    }
}

/// Reorders host events that arrive on concurrent IPC tasks
#[derive(Debug, Default)]
struct Sequencer {
    next: u64,
    held: BTreeMap<u64, InputEvent>,
}

/// Surface fed by a host that owns the real widget
///
/// The host pushes bounds with [`BridgedSurface::set_bounds`] and events with
/// [`BridgedSurface::dispatch_sequenced`]; render updates go to the installed
/// sink. Delivery is serialized: listeners never see two events at once.
pub struct BridgedSurface {
    bounds: ParkingMutex<SurfaceRect>,
    listeners: ParkingMutex<Vec<(ListenerId, InputListener)>>,
    next_id: AtomicU64,
    renderer: ParkingMutex<Option<RenderSink>>,
    sequencer: ParkingMutex<Sequencer>,
}

impl BridgedSurface {
    pub fn new(bounds: SurfaceRect) -> Self {
        Self {
            bounds: ParkingMutex::new(bounds),
            listeners: ParkingMutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            renderer: ParkingMutex::new(None),
            sequencer: ParkingMutex::new(Sequencer::default()),
        }
    }

    pub fn set_bounds(&self, bounds: SurfaceRect) {
        tracing::debug!(
            "Surface bounds changed to {}x{} at ({}, {})",
            bounds.width,
            bounds.height,
            bounds.left,
            bounds.top
        );
        *self.bounds.lock() = bounds;
    }

    pub fn set_renderer(&self, renderer: RenderSink) {
        *self.renderer.lock() = Some(renderer);
    }

    /// Deliver an event to every current listener, in call order
    pub fn dispatch(&self, event: &InputEvent) {
        let _delivery = self.sequencer.lock();
        self.deliver(event);
    }

    /// Deliver the host's `seq`-th event once every earlier one was delivered
    ///
    /// Events may arrive in any order; they reach listeners strictly by
    /// sequence number. Numbers already delivered are dropped. When more than
    /// a bounded number of events wait on a missing one, the gap is skipped.
    pub fn dispatch_sequenced(&self, seq: u64, event: InputEvent) {
        let mut sequencer = self.sequencer.lock();
        if seq < sequencer.next {
            tracing::warn!("Dropping stale input event #{} (expecting #{})", seq, sequencer.next);
            return;
        }
        sequencer.held.insert(seq, event);

        if sequencer.held.len() > MAX_HELD_EVENTS {
            let first = sequencer.held.keys().next().copied();
            if let Some(first) = first {
                tracing::warn!("Input events #{}..#{} never arrived; skipping", sequencer.next, first);
                sequencer.next = first;
            }
        }

        // Delivery happens under the sequencer lock so a later event can
        // never overtake an earlier one on another thread.
        loop {
            let next = sequencer.next;
            let Some(event) = sequencer.held.remove(&next) else {
                break;
            };
            sequencer.next += 1;
            self.deliver(&event);
        }
    }

    /// Start numbering host events from zero again (page reload, remount)
    pub fn reset_sequence(&self) {
        let mut sequencer = self.sequencer.lock();
        if !sequencer.held.is_empty() {
            tracing::debug!("Discarding {} held input events", sequencer.held.len());
        }
        *sequencer = Sequencer::default();
    }

    /// Listeners registered right now
    pub(crate) fn current_listeners(&self) -> Vec<InputListener> {
        self.listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    // Listeners run without the listener lock held so they may render freely.
    fn deliver(&self, event: &InputEvent) {
        for listener in self.current_listeners() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Default for BridgedSurface {
    fn default() -> Self {
        Self::new(SurfaceRect::default())
    }
}

impl InputSurface for BridgedSurface {
    fn bounding_box(&self) -> SurfaceRect {
        *self.bounds.lock()
    }

    fn subscribe(&self, listener: InputListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }

    fn render(&self, update: SurfaceUpdate) {
        if let Some(renderer) = self.renderer.lock().as_ref() {
            renderer(&update);
        }
    }
}
