//! Tauri command handlers
//!
//! This module contains the IPC commands the webview calls, and the glue that
//! turns core callbacks (render updates, notices, wallet prompts) into window
//! events.

pub mod gesture;
pub mod wallet;

use crate::capture::surface::{BridgedSurface, SurfaceUpdate};
use crate::config::GestureConfig;
use crate::coordinator::{AuthorizationWatch, GestureCoordinator, Notice, NoticeSink};
use crate::error::GestureResult;
use crate::submit::HttpSubmitter;
use crate::wallet::{AuthorizationProvider, BridgedWallet, JsonRpcWallet};
use parking_lot::Mutex as ParkingMutex;
use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;

pub const RENDER_EVENT: &str = "gesture://render";
pub const NOTICE_EVENT: &str = "gesture://notice";
pub const WALLET_CONNECT_EVENT: &str = "gesture://wallet-connect";

/// Application state for the challenge
pub struct GestureState {
    pub coordinator: Arc<Mutex<GestureCoordinator>>,
    pub surface: Arc<BridgedSurface>,
    pub bridge: Arc<BridgedWallet>,
    pub watch: ParkingMutex<Option<AuthorizationWatch>>,
}

impl GestureState {
    pub fn build(app: AppHandle, config: GestureConfig) -> GestureResult<Self> {
        let surface = Arc::new(BridgedSurface::default());
        let render_handle = app.clone();
        surface.set_renderer(Box::new(move |update: &SurfaceUpdate| {
            if let Err(e) = render_handle.emit(RENDER_EVENT, update) {
                tracing::warn!("Failed to emit render update: {}", e);
            }
        }));

        let bridge = Arc::new(BridgedWallet::new());
        let prompt_handle = app.clone();
        bridge.set_prompt(Box::new(move || {
            if let Err(e) = prompt_handle.emit(WALLET_CONNECT_EVENT, ()) {
                tracing::warn!("Failed to request wallet connection: {}", e);
            }
        }));

        let wallet: Arc<dyn AuthorizationProvider> = match &config.wallet_rpc_url {
            Some(url) => {
                tracing::info!("Using JSON-RPC wallet at {}", url);
                Arc::new(JsonRpcWallet::new(url.clone(), config.request_timeout())?)
            }
            None => bridge.clone(),
        };
        let submitter = Arc::new(HttpSubmitter::from_config(&config)?);
        let notices = Arc::new(WindowNotices { app });

        let coordinator = GestureCoordinator::new(config, surface.clone(), wallet, submitter, notices);

        Ok(Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
            surface,
            bridge,
            watch: ParkingMutex::new(None),
        })
    }
}

#[derive(Clone, Serialize)]
struct NoticePayload {
    notice: Notice,
    message: &'static str,
    error: bool,
}

/// Shows notices in the webview
struct WindowNotices {
    app: AppHandle,
}

impl NoticeSink for WindowNotices {
    fn notify(&self, notice: Notice) {
        tracing::info!("Notice: {}", notice);
        let payload = NoticePayload {
            notice,
            message: notice.message(),
            error: notice.is_error(),
        };
        if let Err(e) = self.app.emit(NOTICE_EVENT, payload) {
            tracing::warn!("Failed to emit notice: {}", e);
        }
    }
}
