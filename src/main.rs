use axum::{
    routing::{get, post, put},
    Router,
};
use jobboard_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth::require_bearer_auth,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        let interval = Duration::from_secs(config.sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.reminder_service.run_reminder_sweep().await {
                    tracing::error!(error = ?e, "Reminder sweep error");
                }
                if let Err(e) = state.reminder_service.run_expiry_sweep().await {
                    tracing::error!(error = ?e, "Expiry sweep error");
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/applications/confirm",
            get(routes::application_routes::confirm_via_token),
        );

    let authed_api = Router::new()
        .route(
            "/api/applications",
            post(routes::application_routes::submit_application),
        )
        .route(
            "/api/applications/:id",
            get(routes::application_routes::get_application),
        )
        .route(
            "/api/jobs/:job_id/applications",
            get(routes::application_routes::list_for_job),
        )
        .route(
            "/api/candidates/:candidate_id/applications",
            get(routes::application_routes::list_for_candidate),
        )
        .route(
            "/api/applications/:id/schedule",
            put(routes::application_routes::schedule_interview),
        )
        .route(
            "/api/applications/:id/accept",
            put(routes::application_routes::accept_interview),
        )
        .route(
            "/api/applications/:id/reschedule",
            put(routes::application_routes::request_reschedule),
        )
        .route(
            "/api/applications/:id/request-confirmation",
            post(routes::application_routes::request_confirmation),
        )
        .route(
            "/api/applications/:id/hire",
            put(routes::application_routes::hire),
        )
        .route(
            "/api/applications/:id/deny",
            put(routes::application_routes::deny),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    let app = public_api
        .merge(authed_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
