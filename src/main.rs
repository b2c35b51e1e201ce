// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use nslabel::{
    constants::{
        ERROR_REQUEUE_DURATION_SECS, HTTP_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH,
        METRICS_SERVER_PORT, RESYNC_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS,
        WEBHOOK_SERVER_PORT,
    },
    crd::NamespaceLabel,
    metrics,
    reconcilers::reconcile_namespacelabel,
    webhook::webhook_router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("nslabel-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize logging with custom format
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug cargo run
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json cargo run
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting NamespaceLabel Controller");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    // Controller and HTTP servers should never exit; if one does, log it and
    // exit the main process so the orchestrator restarts the pod
    tokio::select! {
        result = run_namespacelabel_controller(client.clone()) => {
            error!("CRITICAL: NamespaceLabel controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("NamespaceLabel controller exited unexpectedly without error")
        }
        result = run_webhook_server(client.clone()) => {
            error!("CRITICAL: Admission webhook server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Admission webhook server exited unexpectedly without error")
        }
        result = run_metrics_server() => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
    }
}

/// Run the `NamespaceLabel` controller
async fn run_namespacelabel_controller(client: Client) -> Result<()> {
    info!("Starting NamespaceLabel controller");

    let api = Api::<NamespaceLabel>::all(client.clone());

    Controller::new(api, Config::default())
        .run(reconcile_namespacelabel_wrapper, error_policy, Arc::new(client))
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `NamespaceLabel`
async fn reconcile_namespacelabel_wrapper(
    nslabel: Arc<NamespaceLabel>,
    ctx: Arc<Client>,
) -> Result<Action, ReconcileError> {
    debug!(
        name = %nslabel.name_any(),
        namespace = ?nslabel.namespace(),
        "Reconcile wrapper called for NamespaceLabel"
    );

    let started = Instant::now();
    match reconcile_namespacelabel((*ctx).clone(), (*nslabel).clone()).await {
        Ok(()) => {
            metrics::record_reconciliation_success(started.elapsed());

            // Periodic resync repairs external label drift even without events
            Ok(Action::requeue(Duration::from_secs(
                RESYNC_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            metrics::record_reconciliation_error(started.elapsed());
            error!("Failed to reconcile NamespaceLabel: {}", e);
            Err(e.into())
        }
    }
}

/// Error policy for the controller
fn error_policy(
    _resource: Arc<impl std::fmt::Debug>,
    _err: &ReconcileError,
    _ctx: Arc<Client>,
) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Run the admission webhook HTTP server.
///
/// TLS is terminated by the surrounding deployment (e.g. a sidecar or
/// service mesh); this listener speaks plain HTTP.
async fn run_webhook_server(client: Client) -> Result<()> {
    let addr = format!("{HTTP_SERVER_BIND_ADDRESS}:{WEBHOOK_SERVER_PORT}");
    info!("Starting admission webhook server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, webhook_router(client)).await?;

    Ok(())
}

/// Run the metrics and health HTTP server
async fn run_metrics_server() -> Result<()> {
    let addr = format!("{HTTP_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
    info!("Starting metrics server on {}", addr);

    let router = Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Serve Prometheus metrics in text exposition format
async fn metrics_handler() -> Result<String, (axum::http::StatusCode, String)> {
    metrics::gather_metrics().map_err(|e| {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to gather metrics: {e}"),
        )
    })
}
