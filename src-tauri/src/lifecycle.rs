//! Shutdown orchestration.
//!
//! Every quit path (window close, app quit, forced quit) funnels through
//! [`perform_shutdown`], which delegates to the supervisor's idempotent
//! `stop()`. Calling it more than once is harmless.

use roost_runtime::Supervisor;
use tracing::info;

/// Stop the supervised API server.
pub async fn perform_shutdown(supervisor: &Supervisor) {
    info!("Shutting down API server");
    supervisor.stop().await;
    info!("Shutdown complete");
}
