// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use gesture_challenge_lib::GestureConfig;

fn main() -> anyhow::Result<()> {
    let config = GestureConfig::load().context("failed to load configuration")?;
    gesture_challenge_lib::run(config)
}
