// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod lifecycle;

use std::sync::Arc;

use roost_core::SupervisorConfig;
use roost_runtime::Supervisor;
use roost_tauri::events;
use tauri::{Emitter, Manager};
use tracing::{error, info};

/// Initialize tracing for the shell.
///
/// Log level is controlled by the RUST_LOG environment variable
/// (default: info).
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .init();
}

/// Build the supervisor config: an explicit `ROOST_SERVER_BIN` wins,
/// otherwise the release-then-debug probe relative to the repo root.
fn supervisor_config() -> std::io::Result<SupervisorConfig> {
    match std::env::var("ROOST_SERVER_BIN") {
        Ok(path) => Ok(SupervisorConfig::new(path)),
        Err(_) => SupervisorConfig::with_defaults(),
    }
}

fn main() {
    init_tracing();
    info!("Shell starting");

    tauri::Builder::default()
        .setup(|app| {
            let supervisor = Arc::new(Supervisor::new(supervisor_config()?));

            // start() suspends until Ready or a terminal failure; any
            // failure here takes the whole shell down.
            let endpoint = tauri::async_runtime::block_on(supervisor.start()).map_err(|e| {
                error!(error = %e, "Failed to start API server");
                e
            })?;

            info!(port = endpoint.port, "API server ready");
            let _ = app.emit(events::SERVER_READY, endpoint.port);

            app.manage(supervisor);
            Ok(())
        })
        .invoke_handler(roost_tauri::handler())
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                // One of several shutdown paths; they all converge on the
                // same idempotent stop()
                let supervisor = window.app_handle().state::<Arc<Supervisor>>().inner().clone();
                tauri::async_runtime::spawn(async move {
                    lifecycle::perform_shutdown(&supervisor).await;
                });
            }
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let tauri::RunEvent::ExitRequested { api, code, .. } = event {
                // code is Some when our own exit() re-enters this handler
                if code.is_none() {
                    api.prevent_exit();
                    let handle = app_handle.clone();
                    tauri::async_runtime::spawn(async move {
                        if let Some(supervisor) = handle.try_state::<Arc<Supervisor>>() {
                            lifecycle::perform_shutdown(&supervisor).await;
                        }
                        handle.exit(0);
                    });
                }
            }
        });
}
