#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use basic2d::app::{AppConfig, run};

fn main() -> basic2d::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    run(AppConfig::default())
}
