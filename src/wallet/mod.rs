//! Wallet authorization
//!
//! The coordinator never looks for a wallet itself. It is handed an
//! [`AuthorizationProvider`] and treats any non-empty account list as
//! authorization to capture and submit.

pub mod bridged;
pub mod json_rpc;

use crate::error::GestureResult;
use async_trait::async_trait;
use tokio::sync::watch;

pub use bridged::BridgedWallet;
pub use json_rpc::JsonRpcWallet;

/// Source of connected wallet accounts
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Accounts currently connected; `WalletUnavailable` when no wallet exists
    async fn current_accounts(&self) -> GestureResult<Vec<String>>;

    /// Ask the wallet to connect and return the granted accounts
    async fn request_connection(&self) -> GestureResult<Vec<String>>;

    /// Receiver that changes whenever the account set changes
    fn subscribe(&self) -> watch::Receiver<Vec<String>>;
}

/// Authorization derived from an account list
pub fn is_authorized(accounts: &[String]) -> bool {
    !accounts.is_empty()
}

/// Publish an account set, waking subscribers only when it differs
pub(crate) fn publish_accounts(sender: &watch::Sender<Vec<String>>, accounts: Vec<String>) {
    sender.send_if_modified(|current| {
        if *current == accounts {
            false
        } else {
            tracing::info!("Wallet accounts changed ({} connected)", accounts.len());
            *current = accounts;
            true
        }
    });
}
