use crate::{
    api::routes::{
        add_participant, approve_contest, create_contest, create_payment_intent, create_user,
        declare_winner, delete_contest, delete_user, get_contest, get_contests,
        get_my_participations, get_participant_stats, get_participants, get_user_role, get_users,
        health_check, index, issue_token, update_user_role,
    },
    config::Settings,
    domain::{ContestStore, Organizer, ParticipationStore, UserInfo, UserStore},
    infra::{
        db::{DBConnection, DatabasePoolConfig, DatabaseType, SqliteMode},
        file_utils::create_folder,
        payments::{PaymentGateway, StripeClient},
        tokens::TokenIssuer,
    },
};

// Mock implementations only available with e2e-testing feature or debug builds
#[cfg(any(feature = "e2e-testing", debug_assertions))]
use crate::infra::payments_mock::MockPaymentGateway;
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{HeaderValue, Method},
    middleware::{self, AddExtension, Next},
    response::IntoResponse,
    routing::{get, patch, post},
    serve::Serve,
    Router,
};
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use log::{error, info, warn};
use reqwest_middleware::{
    reqwest::{self, Client, Url},
    ClientBuilder, ClientWithMiddleware, Middleware,
};
use secrecy::SecretString;
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    select,
    signal::unix::{signal, SignalKind},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub struct Application {
    server: Serve<
        TcpListener,
        axum::extract::connect_info::IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    db_connections: Vec<DBConnection>,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            config.api_settings.domain, config.api_settings.port
        );
        let listener = SocketAddr::from_str(&address)?;
        let (app_state, db_connections) = build_app(config.clone()).await?;
        let server = build_server(listener, app_state, config.api_settings.origins).await?;
        Ok(Self {
            server,
            db_connections,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        info!("Starting server...");
        let result = self.server.with_graceful_shutdown(shutdown_signal()).await;

        for connection in self.db_connections {
            info!("Closing {} database", connection.database_name);
            connection.close().await;
        }

        match result {
            Ok(_) => {
                info!("Shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("Server shutdown error: {}", e);
                Err(anyhow!("Error during server shutdown: {}", e))
            }
        }
    }
}

pub struct AppState {
    pub organizer: Arc<Organizer>,
    pub users_info: Arc<UserInfo>,
    pub tokens: Arc<TokenIssuer>,
}

/// Builds the payment gateway named by the settings, then the rest of the app around it
pub async fn build_app(config: Settings) -> Result<(AppState, Vec<DBConnection>), anyhow::Error> {
    #[cfg(any(feature = "e2e-testing", debug_assertions))]
    let payments: Arc<dyn PaymentGateway> = if config.payment_settings.mock_enabled {
        info!("Mock payment gateway configured");
        Arc::new(MockPaymentGateway::new())
    } else {
        build_stripe_client(&config)?
    };

    #[cfg(not(any(feature = "e2e-testing", debug_assertions)))]
    let payments: Arc<dyn PaymentGateway> = {
        if config.payment_settings.mock_enabled {
            return Err(anyhow!(
                "Mock payment gateway requires e2e-testing feature or debug build"
            ));
        }
        build_stripe_client(&config)?
    };

    build_app_with_gateway(config, payments).await
}

fn build_stripe_client(config: &Settings) -> Result<Arc<dyn PaymentGateway>, anyhow::Error> {
    let base_url = Url::parse(&config.payment_settings.base_url)?;
    if config.payment_settings.secret_key.is_empty() {
        warn!("No Stripe secret key configured, payment intents will be rejected");
    }
    let client = StripeClient::new(
        build_reqwest_client(),
        &base_url,
        SecretString::from(config.payment_settings.secret_key.clone()),
    );
    info!("Stripe client configured at {}", base_url);
    Ok(Arc::new(client))
}

pub async fn build_app_with_gateway(
    config: Settings,
    payments: Arc<dyn PaymentGateway>,
) -> Result<(AppState, Vec<DBConnection>), anyhow::Error> {
    let data_folder = config.db_settings.data_folder.clone();
    let pool_config: DatabasePoolConfig = config.db_settings.clone().into();
    if pool_config.sqlite_config.mode != SqliteMode::Memory {
        create_folder(&data_folder);
    }

    let users_db = DBConnection::new(
        &data_folder,
        "users",
        pool_config.clone(),
        DatabaseType::Users,
    )
    .await?;
    let contests_db = DBConnection::new(
        &data_folder,
        "contests",
        pool_config,
        DatabaseType::Contests,
    )
    .await?;
    info!("Databases ready in {}", data_folder);

    let users_info = Arc::new(UserInfo::new(UserStore::new(users_db.clone())));
    let organizer = Arc::new(Organizer::new(
        ContestStore::new(contests_db.clone()),
        ParticipationStore::new(contests_db.clone()),
        payments,
        config.payment_settings.currency.clone(),
    ));
    info!("Organizer service configured");

    if config.auth_settings.jwt_secret.is_empty() {
        warn!("Access tokens are signed with an empty secret");
    }
    let tokens = Arc::new(TokenIssuer::new(
        &config.auth_settings.jwt_secret,
        Duration::from_secs(config.auth_settings.token_ttl_secs),
    ));

    let app_state = AppState {
        organizer,
        users_info,
        tokens,
    };
    Ok((app_state, vec![users_db, contests_db]))
}

pub async fn build_server(
    socket_addr: SocketAddr,
    app_state: AppState,
    origins: Vec<String>,
) -> Result<
    Serve<
        TcpListener,
        axum::extract::connect_info::IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    anyhow::Error,
> {
    let listener = TcpListener::bind(socket_addr).await?;

    info!("Setting up service");
    let app = app(app_state, origins);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    info!(
        "Service running @: http://{}:{}",
        socket_addr.ip(),
        socket_addr.port()
    );
    Ok(server)
}

pub fn app(app_state: AppState, origins: Vec<String>) -> Router {
    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true);

    Router::new()
        .route("/", get(index))
        .route("/api/v1/health_check", get(health_check))
        .route("/jwt", post(issue_token))
        .route("/users", get(get_users).post(create_user))
        .route("/users/role/{email}", get(get_user_role))
        .route(
            "/users/{id}",
            patch(update_user_role).delete(delete_user),
        )
        .route("/contests", get(get_contests).post(create_contest))
        .route("/contests/approve/{id}", patch(approve_contest))
        .route("/contests/{id}", get(get_contest).delete(delete_contest))
        .route("/participants", get(get_participants).post(add_participant))
        .route("/participants/stats", get(get_participant_stats))
        .route("/participants/{id}", patch(declare_winner))
        .route("/myParticipations", get(get_my_participations))
        .route("/create-payment-intent", post(create_payment_intent))
        .layer(middleware::from_fn(log_request))
        .with_state(Arc::new(app_state))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}

/// Client for outbound calls, every request and its outcome is logged
pub fn build_reqwest_client() -> ClientWithMiddleware {
    ClientBuilder::new(Client::new())
        .with(LoggingMiddleware)
        .build()
}

struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut axum::http::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();

        info!("Making {} request to: {}", method, url);

        let result = next.run(req, extensions).await;

        match &result {
            Ok(response) => {
                info!("{} {} -> Status: {}", method, url, response.status());
            }
            Err(error) => {
                warn!("{} {} -> Error: {:?}", method, url, error);
            }
        }

        result
    }
}

async fn shutdown_signal() {
    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    select! {
        _ = sigint.recv() => info!("Received SIGINT signal"),
        _ = sigterm.recv() => info!("Received SIGTERM signal"),
    }
}
