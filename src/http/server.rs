//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (locale routing, timeouts, request ID, tracing)
//! - Bind server to listener
//! - Forward routed requests to the origin
//! - Serve the experimentation endpoints (webhook, tracking, discovery)

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CONNECTION, HOST},
        uri::{Authority, Scheme},
        HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, EdgeConfig, FlagConfig};
use crate::experiments::datafile::{datafile_url, DatafileCache};
use crate::experiments::{ExperimentError, FlagEvaluator, HttpDecisionProvider};
use crate::http::cookies::CookieNames;
use crate::http::handlers;
use crate::http::middleware::{discovery_auth_middleware, locale_routing_middleware, Visitor};
use crate::http::request::{request_id_of, UuidRequestId};
use crate::observability::metrics;
use crate::routing::LocaleRouter;

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
const X_EXPERIMENT_VARIATION: HeaderName = HeaderName::from_static("x-experiment-variation");

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid origin address {0:?}")]
    Origin(String),

    #[error("invalid locale header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("experimentation client: {0}")]
    Experiments(#[from] ExperimentError),
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<LocaleRouter>,
    pub cookies: Arc<CookieNames>,
    pub client: Client<HttpConnector, Body>,
    pub origin: Authority,
    pub flags: Option<Arc<FlagEvaluator>>,
    pub flag_config: Arc<FlagConfig>,
    pub datafile: Arc<DatafileCache>,
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn from_config(config: &EdgeConfig) -> Result<Self, ServerError> {
        let router = Arc::new(LocaleRouter::from_config(config)?);
        let cookies = Arc::new(CookieNames::from_config(&config.cookies)?);
        let origin = config
            .origin
            .address
            .parse::<Authority>()
            .map_err(|_| ServerError::Origin(config.origin.address.clone()))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let datafile = Arc::new(DatafileCache::new(
            datafile_url(&config.flags.datafile_base_url, &config.flags.sdk_key),
            Duration::from_secs(config.timeouts.datafile_secs),
        )?);

        let flags = config.flags.enabled.then(|| {
            let provider = Arc::new(HttpDecisionProvider::new(config.flags.decision_url.clone()));
            Arc::new(FlagEvaluator::new(provider, datafile.clone(), &config.flags))
        });

        Ok(Self {
            router,
            cookies,
            client,
            origin,
            flags,
            flag_config: Arc::new(config.flags.clone()),
            datafile,
            webhook_secret: config.webhook.secret.as_deref().map(Arc::from),
        })
    }
}

/// HTTP server for the edge service.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a new server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        let discovery = Router::new()
            .route("/.well-known/flags", get(handlers::flag_discovery))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                discovery_auth_middleware,
            ));

        let mut app = Router::new()
            .route("/api/track", post(handlers::track_event))
            .merge(discovery);

        if config.webhook.enabled {
            app = app.route(&config.webhook.path, post(handlers::revalidate_datafile));
        }

        // Only page traffic is locale-routed; explicit routes never are.
        let pages = Router::new()
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                locale_routing_middleware,
            ))
            .with_state(state.clone());

        app.with_state(state)
            .fallback_service(pages)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The assembled router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Serve until the shutdown receiver fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward a (possibly rewritten) request to the origin.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id_of(&request);
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = match Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(state.origin.clone())
        .path_and_query(path_and_query)
        .build()
    {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build origin URI");
            return (StatusCode::BAD_GATEWAY, "Origin request failed").into_response();
        }
    };

    if let Some(host) = parts.headers.remove(HOST) {
        parts.headers.insert(X_FORWARDED_HOST, host);
    }
    parts.headers.remove(CONNECTION);

    if let Some(visitor) = parts.extensions.get::<Visitor>().cloned() {
        forward_visitor(&state, &mut parts.headers, &visitor).await;
    }

    tracing::debug!(request_id = %request_id, uri = %uri, "Forwarding to origin");
    parts.uri = uri;
    let upstream = Request::from_parts(parts, body);

    match state.client.request(upstream).await {
        Ok(response) => {
            metrics::record_origin_request(response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Origin error");
            metrics::record_origin_request(StatusCode::BAD_GATEWAY.as_u16(), start);
            (StatusCode::BAD_GATEWAY, "Origin request failed").into_response()
        }
    }
}

/// Attach locale, visitor id and, on experiment routes, the variation.
async fn forward_visitor(state: &AppState, headers: &mut axum::http::HeaderMap, visitor: &Visitor) {
    if let Ok(value) = HeaderValue::from_str(&visitor.locale) {
        headers.insert(state.cookies.locale_header.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(&visitor.user_id) {
        headers.insert(X_USER_ID, value);
    }

    if !visitor.experiment {
        return;
    }
    if let Some(flags) = &state.flags {
        let variation = flags.variation(&visitor.user_id).await;
        if let Ok(value) = HeaderValue::from_str(&variation) {
            headers.insert(X_EXPERIMENT_VARIATION, value);
        }
    }
}
