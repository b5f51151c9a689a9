//! Serve command - runs the Userbase HTTP server.

use std::{sync::Arc, time::Duration};

use tokio::signal::unix::{SignalKind, signal};
use userbase::user::{Authenticator, TokenIssuer, UserRepository};

use crate::api::{AppState, router};
use crate::backend::{backend_label, close, create_backend, persist};
use crate::cli::ServeArgs;

/// Run the Userbase server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;

    let repo = UserRepository::new(backend.clone(), args.backend_config.op_timeout()).await?;
    let tokens = TokenIssuer::from_optional_secret(args.jwt_secret.as_deref())
        .with_ttl(Duration::from_secs(args.token_ttl_secs));
    let auth = Authenticator::new(Arc::new(repo), Arc::new(tokens));

    let app = router(AppState::new(backend.clone(), auth));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        backend = %backend_label(&args.backend_config),
        "Userbase server started"
    );
    println!("Userbase listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  POST   /login             - Exchange credentials for a token");
    println!("  POST   /sign-up           - Register a new user");
    println!("  GET    /users             - List users");
    println!("  GET    /users/{{username}}  - Look up a user");
    println!("  DELETE /users/{{username}}  - Delete a user");
    println!("  GET    /health            - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // All requests have drained; persist what they wrote
    if let Err(e) = persist(backend.as_ref(), &args.backend_config).await {
        tracing::error!("Failed to save database: {e}");
        eprintln!("Failed to save database: {e}");
    }
    close(backend.as_ref()).await;

    println!("Server shut down");
    Ok(())
}

/// Resolves on SIGTERM or SIGINT.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Failed to set up SIGTERM handler: {e}; only Ctrl+C will stop the server");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
            }
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sigint) => sigint,
        Err(e) => {
            tracing::warn!("Failed to set up SIGINT handler: {e}");
            sigterm.recv().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}
