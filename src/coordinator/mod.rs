//! Gesture challenge coordinator
//!
//! Owns the active mode, the last fingerprint and the authorization flag, and
//! mounts exactly one capture component at a time on the input surface.
//! Failures stop here: every public operation reports problems to the user
//! through the [`NoticeSink`] and logs them, and none return errors.

pub mod state;
pub mod watch;

use crate::capture::path::PathCapture;
use crate::capture::sequence::{SequenceCapture, Target};
use crate::capture::surface::InputSurface;
use crate::capture::CaptureContext;
use crate::config::GestureConfig;
use crate::error::{GestureError, GestureResult};
use crate::fingerprint::Fingerprint;
use crate::submit::{GestureSubmitter, SubmissionReceipt};
use crate::wallet::{is_authorized, AuthorizationProvider};
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub use state::{ChallengeSnapshot, CollectedNotices, LogNotices, Mode, Notice, NoticeSink};
pub use watch::{watch_authorization, AuthorizationWatch};

enum ActiveCapture {
    Path(PathCapture),
    Sequence(SequenceCapture),
}

impl ActiveCapture {
    fn id(&self) -> Uuid {
        match self {
            ActiveCapture::Path(capture) => capture.id(),
            ActiveCapture::Sequence(capture) => capture.id(),
        }
    }

    fn targets(&self) -> Vec<Target> {
        match self {
            ActiveCapture::Path(_) => Vec::new(),
            ActiveCapture::Sequence(capture) => capture.targets(),
        }
    }
}

/// Last fingerprint, tagged with the capture generation allowed to replace it
#[derive(Debug, Default)]
struct FingerprintSlot {
    generation: u64,
    fingerprint: Option<Fingerprint>,
}

pub struct GestureCoordinator {
    config: GestureConfig,
    surface: Arc<dyn InputSurface>,
    wallet: Arc<dyn AuthorizationProvider>,
    submitter: Arc<dyn GestureSubmitter>,
    notices: Arc<dyn NoticeSink>,
    authorized: Arc<AtomicBool>,
    fingerprint: Arc<ParkingMutex<FingerprintSlot>>,
    mode: Mode,
    active: Option<ActiveCapture>,
}

impl GestureCoordinator {
    pub fn new(
        config: GestureConfig,
        surface: Arc<dyn InputSurface>,
        wallet: Arc<dyn AuthorizationProvider>,
        submitter: Arc<dyn GestureSubmitter>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            config,
            surface,
            wallet,
            submitter,
            notices,
            authorized: Arc::new(AtomicBool::new(false)),
            fingerprint: Arc::new(ParkingMutex::new(FingerprintSlot::default())),
            mode: Mode::default(),
            active: None,
        }
    }

    /// Query the wallet once and mount the capture for the current mode
    pub async fn mount(&mut self) {
        self.refresh_authorization().await;
        self.remount();
        tracing::info!(
            "Gesture challenge mounted (mode={}, authorized={})",
            self.mode,
            self.is_authorized()
        );
    }

    /// Release the capture component and its surface listener
    pub fn unmount(&mut self) {
        self.fingerprint.lock().generation += 1;
        if self.active.take().is_some() {
            tracing::info!("Gesture challenge unmounted");
        }
    }

    /// Switch mode, discarding the fingerprint and the previous capture
    pub fn set_mode(&mut self, mode: Mode) {
        tracing::info!("Switching mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.fingerprint.lock().fingerprint = None;
        self.remount();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint.lock().fingerprint.clone()
    }

    /// Record the fingerprint of a completed gesture
    pub fn on_fingerprint(&self, fingerprint: Fingerprint) {
        self.fingerprint.lock().fingerprint = Some(fingerprint);
    }

    /// Activate a sequence target directly (hosts that render their own buttons)
    pub fn activate(&self, index: usize) -> Option<Fingerprint> {
        match &self.active {
            Some(ActiveCapture::Sequence(capture)) => capture.activate(index),
            _ => {
                tracing::debug!("Ignoring activation of target {} outside sequence mode", index);
                None
            }
        }
    }

    pub fn snapshot(&self) -> ChallengeSnapshot {
        ChallengeSnapshot {
            mode: self.mode,
            fingerprint: self.fingerprint(),
            authorized: self.is_authorized(),
            capture_id: self.active.as_ref().map(ActiveCapture::id),
            targets: self
                .active
                .as_ref()
                .map(ActiveCapture::targets)
                .unwrap_or_default(),
        }
    }

    /// Re-read the wallet's accounts
    pub async fn refresh_authorization(&mut self) {
        let accounts = match self.wallet.current_accounts().await {
            Ok(accounts) => accounts,
            Err(GestureError::WalletUnavailable) => {
                tracing::debug!("No wallet provider present");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read wallet accounts: {}", e);
                Vec::new()
            }
        };
        self.apply_accounts(&accounts);
    }

    /// Adopt a new account set; a change of authorization remounts the capture
    pub fn apply_accounts(&mut self, accounts: &[String]) {
        let authorized = is_authorized(accounts);
        let previous = self.authorized.swap(authorized, Ordering::SeqCst);
        if previous != authorized {
            tracing::info!("Wallet authorization changed: {}", authorized);
            if self.active.is_some() {
                self.remount();
            }
        }
    }

    /// Adopt the outcome of a wallet connection request
    pub fn finish_connection(&mut self, outcome: GestureResult<Vec<String>>) -> bool {
        match outcome {
            Ok(accounts) => {
                self.apply_accounts(&accounts);
                self.is_authorized()
            }
            Err(GestureError::WalletUnavailable) => {
                self.notices.notify(Notice::InstallWallet);
                false
            }
            Err(e) => {
                tracing::error!("Wallet connection failed: {}", e);
                false
            }
        }
    }

    /// Send the current fingerprint to the submission endpoint
    ///
    /// Every call that passes the checks issues a request, including repeats of
    /// an already submitted fingerprint.
    pub async fn submit(&self) -> Option<SubmissionReceipt> {
        if !self.is_authorized() {
            self.notices.notify(Notice::ConnectWalletFirst);
            return None;
        }
        let Some(fingerprint) = self.fingerprint() else {
            self.notices.notify(Notice::NoGestureHash);
            return None;
        };

        match self.submitter.submit(&fingerprint).await {
            Ok(receipt) => {
                self.notices.notify(Notice::Submitted);
                Some(receipt)
            }
            Err(e) => {
                tracing::error!("Error submitting gesture: {}", e);
                self.notices.notify(Notice::SubmissionFailed);
                None
            }
        }
    }

    pub fn wallet(&self) -> &Arc<dyn AuthorizationProvider> {
        &self.wallet
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Context for a capture of `generation`; emits from older captures are dropped
    fn capture_context(&self, generation: u64) -> CaptureContext {
        let slot = self.fingerprint.clone();
        CaptureContext::new(
            self.authorized.clone(),
            self.notices.clone(),
            Arc::new(move |fingerprint: Fingerprint| {
                let mut slot = slot.lock();
                if slot.generation == generation {
                    slot.fingerprint = Some(fingerprint);
                } else {
                    tracing::debug!("Dropping fingerprint {} from a retired capture", fingerprint);
                }
            }),
        )
    }

    fn remount(&mut self) {
        // The old capture must release the surface before the new one subscribes.
        self.active = None;

        let generation = {
            let mut slot = self.fingerprint.lock();
            slot.generation += 1;
            slot.generation
        };
        let context = self.capture_context(generation);
        let capture = match self.mode {
            Mode::Path => ActiveCapture::Path(PathCapture::mount(self.surface.clone(), context)),
            Mode::Sequence => ActiveCapture::Sequence(SequenceCapture::mount(
                self.surface.clone(),
                context,
                self.config.target_count,
                self.config.target_size,
            )),
        };
        self.active = Some(capture);
    }
}

/// Ask the wallet to connect
///
/// The coordinator is not locked while the user answers the wallet prompt. An
/// unanswered prompt gives up after the configured connect timeout.
pub async fn connect_wallet(coordinator: &Mutex<GestureCoordinator>) -> bool {
    let (wallet, timeout) = {
        let coordinator = coordinator.lock().await;
        (coordinator.wallet.clone(), coordinator.config.connect_timeout())
    };

    let outcome = match tokio::time::timeout(timeout, wallet.request_connection()).await {
        Ok(outcome) => outcome,
        Err(_) => Err(GestureError::WalletRejected(format!(
            "no answer within {}ms",
            timeout.as_millis()
        ))),
    };

    coordinator.lock().await.finish_connection(outcome)
}

impl Drop for GestureCoordinator {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::types::{InputEvent, PointerSample, SurfaceRect};
    use crate::capture::surface::BridgedSurface;
    use crate::wallet::BridgedWallet;
    use std::time::Duration;
    use tokio::sync::Notify;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct FakeSubmitter {
        calls: AtomicUsize,
        submitted: ParkingMutex<Vec<Fingerprint>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl GestureSubmitter for FakeSubmitter {
        async fn submit(&self, fingerprint: &Fingerprint) -> GestureResult<SubmissionReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.submitted.lock().push(fingerprint.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(GestureError::SubmissionRejected { status: 503 });
            }
            Ok(SubmissionReceipt {
                fingerprint: fingerprint.clone(),
                status: 200,
                response: None,
                submitted_at: chrono::Utc::now(),
            })
        }
    }

    struct Fixture {
        surface: Arc<BridgedSurface>,
        wallet: Arc<BridgedWallet>,
        submitter: Arc<FakeSubmitter>,
        notices: Arc<CollectedNotices>,
        coordinator: GestureCoordinator,
    }

    fn fixture(accounts: Option<Vec<&str>>) -> Fixture {
        let surface = Arc::new(BridgedSurface::new(SurfaceRect::new(0.0, 0.0, 800.0, 400.0)));
        let wallet = Arc::new(BridgedWallet::new());
        if let Some(accounts) = accounts {
            wallet.set_installed(true);
            wallet.set_accounts(accounts.into_iter().map(String::from).collect());
        }
        let submitter = Arc::new(FakeSubmitter::default());
        let notices = Arc::new(CollectedNotices::default());
        let coordinator = GestureCoordinator::new(
            GestureConfig::default(),
            surface.clone(),
            wallet.clone(),
            submitter.clone(),
            notices.clone(),
        );
        Fixture {
            surface,
            wallet,
            submitter,
            notices,
            coordinator,
        }
    }

    fn draw(surface: &BridgedSurface, points: &[(f64, f64)]) {
        let (first, rest) = points.split_first().unwrap();
        surface.dispatch(&InputEvent::Press(PointerSample::mouse(first.0, first.1)));
        for (x, y) in rest {
            surface.dispatch(&InputEvent::Move(PointerSample::mouse(*x, *y)));
        }
        surface.dispatch(&InputEvent::Release);
    }

    #[tokio::test]
    async fn test_draw_and_submit() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        assert!(f.coordinator.is_authorized());

        draw(&f.surface, &[(0.0, 0.0), (10.0, 10.0)]);
        let fingerprint = f.coordinator.fingerprint().unwrap();
        assert_eq!(
            fingerprint.as_str(),
            "0xcd712735afe4a06db206dc435b1cf20fb43de08b86b92d59abda254b4e2860e7"
        );

        let receipt = f.coordinator.submit().await.unwrap();
        assert_eq!(receipt.fingerprint, fingerprint);
        assert_eq!(*f.submitter.submitted.lock(), vec![fingerprint]);
        assert_eq!(f.notices.take(), vec![Notice::Submitted]);
    }

    #[tokio::test]
    async fn test_submit_unauthorized_never_calls_network() {
        let mut f = fixture(None);
        f.coordinator.mount().await;

        assert!(f.coordinator.submit().await.is_none());
        f.coordinator.on_fingerprint(Fingerprint::of_bytes(b"[]"));
        assert!(f.coordinator.submit().await.is_none());

        assert_eq!(f.submitter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            f.notices.take(),
            vec![Notice::ConnectWalletFirst, Notice::ConnectWalletFirst]
        );
    }

    #[tokio::test]
    async fn test_submit_without_fingerprint() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;

        assert!(f.coordinator.submit().await.is_none());

        assert_eq!(f.submitter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.notices.take(), vec![Notice::NoGestureHash]);
    }

    #[tokio::test]
    async fn test_submission_failure_is_reported() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        f.submitter.fail.store(true, Ordering::SeqCst);
        draw(&f.surface, &[(5.0, 5.0)]);

        assert!(f.coordinator.submit().await.is_none());

        assert_eq!(f.submitter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.notices.take(), vec![Notice::SubmissionFailed]);
        assert!(f.coordinator.fingerprint().is_some());
    }

    #[tokio::test]
    async fn test_repeat_submissions_are_not_suppressed() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        draw(&f.surface, &[(5.0, 5.0)]);

        f.coordinator.submit().await;
        f.coordinator.submit().await;

        assert_eq!(f.submitter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_fingerprint_before_authorization() {
        let mut f = fixture(Some(vec![]));
        f.coordinator.mount().await;

        draw(&f.surface, &[(0.0, 0.0), (10.0, 10.0)]);
        assert_eq!(f.coordinator.fingerprint(), None);
        assert_eq!(f.notices.take(), vec![Notice::DrawUnauthorized]);

        f.coordinator.apply_accounts(&["0xabc".to_string()]);
        draw(&f.surface, &[(0.0, 0.0), (10.0, 10.0)]);
        assert!(f.coordinator.fingerprint().is_some());
    }

    #[tokio::test]
    async fn test_mode_switch_resets_fingerprint_and_capture() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        let path_id = f.coordinator.snapshot().capture_id.unwrap();
        draw(&f.surface, &[(1.0, 1.0), (2.0, 2.0)]);
        assert!(f.coordinator.fingerprint().is_some());

        f.coordinator.set_mode(Mode::Sequence);

        let snapshot = f.coordinator.snapshot();
        assert_eq!(snapshot.mode, Mode::Sequence);
        assert_eq!(snapshot.fingerprint, None);
        assert_ne!(snapshot.capture_id.unwrap(), path_id);
        assert_eq!(snapshot.targets.len(), 5);
        assert_eq!(f.surface.listener_count(), 1);

        // Switching to the same mode still starts over.
        f.coordinator.activate(0);
        f.coordinator.set_mode(Mode::Sequence);
        assert!(f.coordinator.snapshot().targets.iter().all(|t| !t.activated));
    }

    #[tokio::test]
    async fn test_sequence_mode_flow() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        f.coordinator.set_mode(Mode::Sequence);

        for index in [2, 0, 4, 1, 3] {
            f.coordinator.activate(index);
        }

        assert_eq!(
            f.coordinator.fingerprint().unwrap().as_str(),
            "0xdcb6637a60a9516030d71b920d4d696c075769b1ef1e0d2a6c5036e8e878d0e0"
        );
    }

    #[tokio::test]
    async fn test_targets_appear_once_authorized() {
        let mut f = fixture(Some(vec![]));
        f.coordinator.set_mode(Mode::Sequence);
        f.coordinator.mount().await;
        assert!(f.coordinator.snapshot().targets.is_empty());

        f.coordinator.apply_accounts(&["0xabc".to_string()]);

        assert_eq!(f.coordinator.snapshot().targets.len(), 5);
    }

    #[tokio::test]
    async fn test_absent_wallet_mounts_quietly() {
        let mut f = fixture(None);
        f.coordinator.mount().await;

        assert!(!f.coordinator.is_authorized());
        assert!(f.notices.take().is_empty());
    }

    #[tokio::test]
    async fn test_connect_without_wallet_asks_for_install() {
        let Fixture {
            notices, coordinator, ..
        } = fixture(None);
        let coordinator = Mutex::new(coordinator);
        coordinator.lock().await.mount().await;

        assert!(!connect_wallet(&coordinator).await);
        assert_eq!(notices.take(), vec![Notice::InstallWallet]);
    }

    #[tokio::test]
    async fn test_connect_wallet_authorizes() {
        let Fixture {
            wallet, coordinator, ..
        } = fixture(Some(vec![]));
        let weak = Arc::downgrade(&wallet);
        wallet.set_prompt(Box::new(move || {
            if let Some(wallet) = weak.upgrade() {
                wallet.complete_connection(Ok(vec!["0xabc".to_string()]));
            }
        }));
        let coordinator = Mutex::new(coordinator);
        coordinator.lock().await.mount().await;

        assert!(connect_wallet(&coordinator).await);
        assert!(coordinator.lock().await.is_authorized());
    }

    #[tokio::test]
    async fn test_pending_connection_leaves_coordinator_usable() {
        let Fixture {
            wallet, coordinator, ..
        } = fixture(Some(vec![]));
        let prompted = Arc::new(Notify::new());
        let signal = prompted.clone();
        wallet.set_prompt(Box::new(move || signal.notify_one()));
        let coordinator = Arc::new(Mutex::new(coordinator));
        coordinator.lock().await.mount().await;

        let connecting = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { connect_wallet(&coordinator).await }
        });
        prompted.notified().await;

        // The user has not answered yet.
        {
            let mut guard = tokio::time::timeout(Duration::from_secs(1), coordinator.lock())
                .await
                .expect("coordinator locked while the wallet prompt is open");
            assert!(!guard.snapshot().authorized);
            guard.set_mode(Mode::Sequence);
            assert_eq!(guard.snapshot().mode, Mode::Sequence);
        }

        assert!(wallet.complete_connection(Ok(vec!["0xabc".to_string()])));
        assert!(connecting.await.unwrap());
        let snapshot = coordinator.lock().await.snapshot();
        assert!(snapshot.authorized);
        assert_eq!(snapshot.targets.len(), 5);
    }

    #[tokio::test]
    async fn test_unanswered_connection_times_out() {
        let Fixture {
            wallet,
            mut coordinator,
            ..
        } = fixture(Some(vec![]));
        wallet.set_prompt(Box::new(|| {}));
        coordinator.config.connect_timeout_ms = 50;
        let coordinator = Mutex::new(coordinator);
        coordinator.lock().await.mount().await;

        let outcome = tokio::time::timeout(Duration::from_secs(5), connect_wallet(&coordinator)).await;

        assert_eq!(outcome.ok(), Some(false));
        assert!(!coordinator.lock().await.is_authorized());
        assert!(!wallet.complete_connection(Ok(vec!["0xabc".to_string()])));
    }

    #[tokio::test]
    async fn test_fingerprint_from_retired_capture_is_ignored() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        f.surface.dispatch(&InputEvent::Press(PointerSample::mouse(1.0, 1.0)));
        f.surface.dispatch(&InputEvent::Move(PointerSample::mouse(5.0, 5.0)));

        // A release already on its way to the path capture when the mode changes.
        let in_flight = f.surface.current_listeners();
        f.coordinator.set_mode(Mode::Sequence);
        for listener in in_flight {
            listener(&InputEvent::Release);
        }

        assert_eq!(f.coordinator.mode(), Mode::Sequence);
        assert_eq!(f.coordinator.fingerprint(), None);
    }

    #[tokio::test]
    async fn test_fingerprint_survives_authorization_remount() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        draw(&f.surface, &[(0.0, 0.0), (10.0, 10.0)]);

        f.coordinator.apply_accounts(&["0xabc".to_string(), "0xdef".to_string()]);
        f.coordinator.apply_accounts(&[]);
        f.coordinator.apply_accounts(&["0xabc".to_string()]);

        assert_eq!(
            f.coordinator.fingerprint().unwrap().as_str(),
            "0xcd712735afe4a06db206dc435b1cf20fb43de08b86b92d59abda254b4e2860e7"
        );
    }

    #[tokio::test]
    async fn test_unmount_releases_surface() {
        let mut f = fixture(Some(vec!["0xabc"]));
        f.coordinator.mount().await;
        assert_eq!(f.surface.listener_count(), 1);

        f.coordinator.unmount();
        assert_eq!(f.surface.listener_count(), 0);
        assert_eq!(f.coordinator.snapshot().capture_id, None);
    }
}
