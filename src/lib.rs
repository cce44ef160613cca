//! Gesture Challenge - draw a path or click targets in order, submit the result.
//!
//! A completed gesture is serialized canonically and hashed with Keccak-256.
//! The resulting fingerprint is sent to a server as a gesture credential once
//! a wallet is connected. The core is host-agnostic; the `desktop` feature adds
//! a Tauri shell whose webview forwards input and wallet events.

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod submit;
pub mod wallet;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(test)]
mod test_server;

pub use config::GestureConfig;
pub use coordinator::{GestureCoordinator, Mode, Notice};
pub use error::{GestureError, GestureResult};
pub use fingerprint::Fingerprint;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Run the desktop application
#[cfg(feature = "desktop")]
pub fn run(config: GestureConfig) -> anyhow::Result<()> {
    use anyhow::Context;
    use tauri::Manager;

    init_tracing(&config.log_filter);
    tracing::info!("Starting Gesture Challenge v{}", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .setup(move |app| {
            let state = commands::GestureState::build(app.handle().clone(), config)?;
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Challenge commands
            commands::gesture::mount_challenge,
            commands::gesture::unmount_challenge,
            commands::gesture::set_mode,
            commands::gesture::dispatch_input,
            commands::gesture::report_surface_bounds,
            commands::gesture::activate_target,
            commands::gesture::submit_gesture,
            commands::gesture::get_challenge_state,
            commands::gesture::get_config,
            // Wallet commands
            commands::wallet::report_wallet,
            commands::wallet::connect_wallet,
            commands::wallet::complete_wallet_connection,
        ])
        .run(tauri::generate_context!())
        .context("error while running tauri application")
}
