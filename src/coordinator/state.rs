//! Coordinator state types

use crate::capture::sequence::Target;
use crate::fingerprint::Fingerprint;
use parking_lot::Mutex as ParkingMutex;
use serde::{Deserialize, Serialize};

/// Which capture component is mounted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Draw a free-form path
    #[default]
    Path,
    /// Click targets in an order of the user's choosing
    Sequence,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Path => write!(f, "path"),
            Mode::Sequence => write!(f, "sequence"),
        }
    }
}

/// User-facing message raised by the capture components or the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    DrawUnauthorized,
    ClickUnauthorized,
    ConnectWalletFirst,
    NoGestureHash,
    Submitted,
    SubmissionFailed,
    InstallWallet,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::DrawUnauthorized => "Please connect your wallet before drawing!",
            Notice::ClickUnauthorized => "Please connect your wallet before clicking!",
            Notice::ConnectWalletFirst => "Please connect your wallet first.",
            Notice::NoGestureHash => "No gesture hash computed.",
            Notice::Submitted => "Gesture submitted successfully!",
            Notice::SubmissionFailed => "Error submitting gesture.",
            Notice::InstallWallet => "Please install MetaMask!",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Submitted)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Where notices are shown to the user
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that only logs
#[derive(Debug, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!("Notice: {}", notice);
        } else {
            tracing::info!("Notice: {}", notice);
        }
    }
}

/// Sink that keeps every notice; used by tests and by hosts that poll
#[derive(Debug, Default)]
pub struct CollectedNotices {
    notices: ParkingMutex<Vec<Notice>>,
}

impl CollectedNotices {
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl NoticeSink for CollectedNotices {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Serializable view of the coordinator for the host UI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSnapshot {
    pub mode: Mode,
    pub fingerprint: Option<Fingerprint>,
    pub authorized: bool,
    pub capture_id: Option<uuid::Uuid>,
    pub targets: Vec<Target>,
}
