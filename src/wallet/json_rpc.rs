//! Wallet reached over Ethereum JSON-RPC
//!
//! Talks to a local signer that speaks the standard provider methods
//! (`eth_accounts`, `eth_requestAccounts`) over HTTP. A signer that cannot be
//! reached counts as no wallet installed.

use crate::error::{GestureError, GestureResult};
use crate::wallet::{publish_accounts, AuthorizationProvider};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// EIP-1193 "user rejected request"
const USER_REJECTED: i64 = 4001;

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Vec<String>>,
    #[serde(default)]
    error: Option<RpcFailure>,
}

#[derive(Debug, Deserialize)]
struct RpcFailure {
    code: i64,
    message: String,
}

pub struct JsonRpcWallet {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
    accounts: watch::Sender<Vec<String>>,
}

impl JsonRpcWallet {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> GestureResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let (accounts, _) = watch::channel(Vec::new());
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
            accounts,
        })
    }

    async fn call(&self, method: &str) -> GestureResult<Vec<String>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::SeqCst),
            "method": method,
            "params": [],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    tracing::debug!("Wallet endpoint {} unreachable: {}", self.endpoint, e);
                    GestureError::WalletUnavailable
                } else {
                    GestureError::Transport(e)
                }
            })?;

        let reply: RpcReply = response.json().await?;
        if let Some(failure) = reply.error {
            return Err(if failure.code == USER_REJECTED {
                GestureError::WalletRejected(failure.message)
            } else {
                GestureError::Rpc(format!("{} ({})", failure.message, failure.code))
            });
        }

        let accounts = reply
            .result
            .ok_or_else(|| GestureError::Rpc(format!("{} returned no result", method)))?;
        publish_accounts(&self.accounts, accounts.clone());
        Ok(accounts)
    }
}

#[async_trait]
impl AuthorizationProvider for JsonRpcWallet {
    async fn current_accounts(&self) -> GestureResult<Vec<String>> {
        self.call("eth_accounts").await
    }

    async fn request_connection(&self) -> GestureResult<Vec<String>> {
        self.call("eth_requestAccounts").await
    }

    fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.accounts.subscribe()
    }
}
