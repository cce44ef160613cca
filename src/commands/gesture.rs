//! Challenge-related Tauri commands

use crate::capture::input::types::{InputEvent, SurfaceRect};
use crate::commands::GestureState;
use crate::config::GestureConfig;
use crate::coordinator::state::ChallengeSnapshot;
use crate::coordinator::{watch_authorization, Mode};
use crate::fingerprint::Fingerprint;
use crate::submit::SubmissionReceipt;
use tauri::State;

/// Mount the challenge: read the wallet, place the capture, follow account changes
#[tauri::command]
pub async fn mount_challenge(
    state: State<'_, GestureState>,
    bounds: SurfaceRect,
) -> Result<ChallengeSnapshot, String> {
    state.surface.set_bounds(bounds);
    state.surface.reset_sequence();

    let snapshot = {
        let mut coordinator = state.coordinator.lock().await;
        coordinator.mount().await;
        coordinator.snapshot()
    };

    if state.watch.lock().is_none() {
        let watch = watch_authorization(state.coordinator.clone()).await;
        *state.watch.lock() = Some(watch);
    }

    Ok(snapshot)
}

/// Release the capture and stop following the wallet
#[tauri::command]
pub async fn unmount_challenge(state: State<'_, GestureState>) -> Result<(), String> {
    state.watch.lock().take();
    state.coordinator.lock().await.unmount();
    Ok(())
}

/// Switch between drawing and clicking
#[tauri::command]
pub async fn set_mode(state: State<'_, GestureState>, mode: Mode) -> Result<ChallengeSnapshot, String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.set_mode(mode);
    Ok(coordinator.snapshot())
}

/// Forward a press/move/release from the challenge area
///
/// Each invocation runs as its own task, so the webview numbers its events
/// from zero after every mount and the surface restores that order.
#[tauri::command]
pub async fn dispatch_input(
    state: State<'_, GestureState>,
    seq: u64,
    event: InputEvent,
) -> Result<(), String> {
    state.surface.dispatch_sequenced(seq, event);
    Ok(())
}

/// Report the challenge area's bounding box (on layout and resize)
#[tauri::command]
pub async fn report_surface_bounds(
    state: State<'_, GestureState>,
    bounds: SurfaceRect,
) -> Result<(), String> {
    state.surface.set_bounds(bounds);
    Ok(())
}

/// Activate a target by index
#[tauri::command]
pub async fn activate_target(
    state: State<'_, GestureState>,
    index: usize,
) -> Result<Option<Fingerprint>, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.activate(index))
}

/// Submit the current fingerprint; the outcome is also shown as a notice
#[tauri::command]
pub async fn submit_gesture(
    state: State<'_, GestureState>,
) -> Result<Option<SubmissionReceipt>, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.submit().await)
}

/// Get the current challenge state
#[tauri::command]
pub async fn get_challenge_state(state: State<'_, GestureState>) -> Result<ChallengeSnapshot, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.snapshot())
}

/// Get the active configuration
#[tauri::command]
pub async fn get_config(state: State<'_, GestureState>) -> Result<GestureConfig, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.config().clone())
}
