//! Wallet driven by the host
//!
//! The host (a webview with an injected browser wallet) reports whether a
//! provider exists, forwards account changes, and answers connection requests.

use crate::error::{GestureError, GestureResult};
use crate::wallet::{publish_accounts, AuthorizationProvider};
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{oneshot, watch};

/// Called when a connection request needs the host to prompt the user
pub type ConnectionPrompt = Box<dyn Fn() + Send + Sync>;

type PendingConnection = oneshot::Sender<Result<Vec<String>, String>>;

pub struct BridgedWallet {
    installed: AtomicBool,
    accounts: watch::Sender<Vec<String>>,
    pending: ParkingMutex<Option<PendingConnection>>,
    prompt: ParkingMutex<Option<ConnectionPrompt>>,
}

impl BridgedWallet {
    pub fn new() -> Self {
        let (accounts, _) = watch::channel(Vec::new());
        Self {
            installed: AtomicBool::new(false),
            accounts,
            pending: ParkingMutex::new(None),
            prompt: ParkingMutex::new(None),
        }
    }

    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Host-reported account set (e.g. from an `accountsChanged` event)
    pub fn set_accounts(&self, accounts: Vec<String>) {
        publish_accounts(&self.accounts, accounts);
    }

    pub fn set_prompt(&self, prompt: ConnectionPrompt) {
        *self.prompt.lock() = Some(prompt);
    }

    /// Resolve the outstanding connection request
    ///
    /// Returns `false` when no request was waiting.
    pub fn complete_connection(&self, outcome: Result<Vec<String>, String>) -> bool {
        match self.pending.lock().take() {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }
}

impl Default for BridgedWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationProvider for BridgedWallet {
    async fn current_accounts(&self) -> GestureResult<Vec<String>> {
        if !self.is_installed() {
            return Err(GestureError::WalletUnavailable);
        }
        Ok(self.accounts.borrow().clone())
    }

    async fn request_connection(&self) -> GestureResult<Vec<String>> {
        if !self.is_installed() {
            return Err(GestureError::WalletUnavailable);
        }

        let (sender, receiver) = oneshot::channel();
        // A newer request supersedes an unanswered one.
        *self.pending.lock() = Some(sender);

        match self.prompt.lock().as_ref() {
            Some(prompt) => prompt(),
            None => {
                self.pending.lock().take();
                return Err(GestureError::WalletRejected(
                    "no host available to prompt for connection".to_string(),
                ));
            }
        }

        match receiver.await {
            Ok(Ok(accounts)) => {
                self.set_accounts(accounts.clone());
                Ok(accounts)
            }
            Ok(Err(reason)) => Err(GestureError::WalletRejected(reason)),
            Err(_) => Err(GestureError::WalletRejected(
                "connection request superseded".to_string(),
            )),
        }
    }

    fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.accounts.subscribe()
    }
}
