//! Follow wallet account changes
//!
//! The wallet pushes account-set changes through a `watch` channel; a task
//! applies each one to the coordinator. Nothing polls.

use crate::coordinator::GestureCoordinator;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Running watch task; stops when dropped
pub struct AuthorizationWatch {
    handle: JoinHandle<()>,
}

impl AuthorizationWatch {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AuthorizationWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Apply every account change the coordinator's wallet reports
pub async fn watch_authorization(coordinator: Arc<Mutex<GestureCoordinator>>) -> AuthorizationWatch {
    let mut changes = coordinator.lock().await.wallet().subscribe();

    let handle = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let accounts = changes.borrow_and_update().clone();
            coordinator.lock().await.apply_accounts(&accounts);
        }
        tracing::debug!("Wallet account stream closed");
    });

    AuthorizationWatch { handle }
}
