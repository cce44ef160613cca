//! Wallet bridge commands
//!
//! The webview owns the injected browser wallet. It reports what it sees and
//! answers connection prompts through these commands.

use crate::commands::GestureState;
use crate::coordinator::connect_wallet as request_wallet_connection;
use crate::coordinator::state::ChallengeSnapshot;
use tauri::State;

/// Report whether a provider exists and which accounts it exposes
#[tauri::command]
pub async fn report_wallet(
    state: State<'_, GestureState>,
    installed: bool,
    accounts: Vec<String>,
) -> Result<(), String> {
    state.bridge.set_installed(installed);
    state.bridge.set_accounts(accounts);
    Ok(())
}

/// Ask the wallet to connect; resolves once the user answers the prompt
#[tauri::command]
pub async fn connect_wallet(state: State<'_, GestureState>) -> Result<ChallengeSnapshot, String> {
    request_wallet_connection(&state.coordinator).await;
    Ok(state.coordinator.lock().await.snapshot())
}

/// Answer a `gesture://wallet-connect` prompt
#[tauri::command]
pub async fn complete_wallet_connection(
    state: State<'_, GestureState>,
    accounts: Option<Vec<String>>,
    error: Option<String>,
) -> Result<bool, String> {
    let outcome = match error {
        Some(reason) => Err(reason),
        None => Ok(accounts.unwrap_or_default()),
    };
    Ok(state.bridge.complete_connection(outcome))
}
