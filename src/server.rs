//! MCP server initialization for stdio and streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that open the database,
//! start the engine, and hand it to the MCP tool handler.

use crate::app::MedCare;
use crate::config::MedcareConfig;
use crate::db;
use crate::identity::StaticSession;
use crate::notify::LogScheduler;
use crate::tools::MedCareTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: open DB, start the engine signed in as the configured user,
/// and refresh alarms for the coming window.
async fn setup_engine(config: MedcareConfig) -> Result<MedCare> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let session = Arc::new(StaticSession::signed_in(config.storage.default_user.clone()));
    let app = MedCare::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(LogScheduler),
        session,
        Arc::new(config),
    );

    let user = app.config().storage.default_user.clone();
    let refreshed = app.refresh_alarms(&user, &chrono::Local::now()).await?;
    tracing::info!(user = %user, prescriptions = refreshed.len(), "alarms refreshed");

    Ok(app)
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MedcareConfig) -> Result<()> {
    tracing::info!("starting MedCare MCP server on stdio");

    let app = setup_engine(config).await?;

    let tools = MedCareTools::new(app);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over streamable HTTP transport.
pub async fn serve_http(config: MedcareConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting MedCare MCP server on HTTP");

    let app = setup_engine(config).await?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MedCareTools::new(app.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
