//! Gesture capture components
//!
//! Each component subscribes to an [`InputSurface`] while mounted, turns raw
//! input into an ordered trace and hands the trace's fingerprint to the
//! coordinator once the gesture is complete.

pub mod input;
pub mod path;
pub mod sequence;
pub mod surface;

use crate::coordinator::state::{Notice, NoticeSink};
use crate::fingerprint::Fingerprint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use input::{InputEvent, Point, PointerSample, SurfaceRect};
pub use path::PathCapture;
pub use sequence::{SequenceCapture, Target};
pub use surface::{BridgedSurface, InputSurface, SurfaceSubscription, SurfaceUpdate};

/// Callback receiving the fingerprint of a completed gesture
pub type FingerprintSink = Arc<dyn Fn(Fingerprint) + Send + Sync>;

/// What a capture component shares with its coordinator
#[derive(Clone)]
pub struct CaptureContext {
    authorized: Arc<AtomicBool>,
    notices: Arc<dyn NoticeSink>,
    on_fingerprint: FingerprintSink,
}

impl CaptureContext {
    pub fn new(
        authorized: Arc<AtomicBool>,
        notices: Arc<dyn NoticeSink>,
        on_fingerprint: FingerprintSink,
    ) -> Self {
        Self {
            authorized,
            notices,
            on_fingerprint,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    pub fn notify(&self, notice: Notice) {
        self.notices.notify(notice);
    }

    pub fn emit(&self, fingerprint: Fingerprint) {
        (self.on_fingerprint)(fingerprint);
    }
}
