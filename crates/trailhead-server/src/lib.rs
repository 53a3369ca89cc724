//! Trailhead Server - control surface of the pipeline
//!
//! Wires configuration, the admin/health HTTP API, and the daily scheduler
//! around one shared `Orchestrator`.

pub mod config;
pub mod control;
pub mod http;
pub mod scheduler;

pub use config::{ScheduleConfig, ServiceConfig};
pub use control::{ControlSurface, Freshness};
pub use http::router;

use std::sync::Arc;
use trailhead_core::errors::{ExError, ExErrorKind, Result};
use trailhead_engine::BootstrapReport;

/// Bootstrap the pipeline, start the scheduler and serve HTTP until Ctrl-C
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let orchestrator = Arc::new(config.build_orchestrator()?);
    log_bootstrap(&orchestrator.bootstrap().await);

    let _scheduler = if config.schedule.enabled {
        Some(scheduler::start(orchestrator.clone(), &config.schedule).await?)
    } else {
        tracing::info!(component = module_path!(), op = "serve", "scheduler disabled");
        None
    };

    let control = Arc::new(ControlSurface::new(orchestrator, config.admin_token.clone()));
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| bind_error(&addr, e))?;
    tracing::info!(component = module_path!(), op = "serve", addr = %addr, "listening");

    axum::serve(listener, router(control))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| bind_error(&addr, e))
}

fn bind_error(addr: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("serve")
        .with_message(format!("{}: {}", addr, err))
}

fn log_bootstrap(report: &BootstrapReport) {
    if let Ok(Some(name)) = &report.restored {
        tracing::info!(
            component = module_path!(),
            op = "bootstrap",
            snapshot = %name,
            "restored"
        );
    }
    match &report.refresh {
        Ok(outcome) if outcome.is_ok() => {
            tracing::info!(
                component = module_path!(),
                op = "bootstrap",
                run_id = outcome.run_id(),
                "initial refresh promoted"
            );
        }
        Ok(outcome) => {
            tracing::warn!(
                component = module_path!(),
                op = "bootstrap",
                run_id = outcome.run_id(),
                "initial refresh rejected"
            );
        }
        Err(e) => {
            tracing::error!(
                component = module_path!(),
                op = "bootstrap",
                error = %e,
                "initial refresh failed"
            );
        }
    }
}
