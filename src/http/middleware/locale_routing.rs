//! Locale & experiment routing middleware.
//!
//! Pass-through requests are untouched. Routed requests are either rewritten
//! (URI replaced, inner service runs) or redirected (307), and then get their
//! locale/user-id cookies and locale header synchronized.

use axum::{
    body::Body,
    extract::State,
    http::{header::ACCEPT_LANGUAGE, uri::PathAndQuery, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::http::cookies::{apply_cookie_sync, CookieJar};
use crate::http::request::request_id_of;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{plan_cookie_sync, RouteKind, RouteRequest, RoutingDecision};

/// Routing outcome attached to rewritten requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub locale: String,
    pub user_id: String,
    pub experiment: bool,
}

pub async fn locale_routing_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let prior_locale = jar.get(&state.cookies.locale).map(String::from);
    let prior_user_id = jar.get(&state.cookies.user_id).map(String::from);

    let decision = state.router.decide(&RouteRequest {
        path: req.uri().path(),
        query: req.uri().query(),
        locale_cookie: prior_locale.as_deref(),
        accept_language: req
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    });

    let route = match decision {
        RoutingDecision::PassThrough => return next.run(req).await,
        RoutingDecision::Route(route) => route,
    };

    let target = route.target();
    metrics::record_routing_decision(route.kind.as_str(), route.experiment);
    tracing::debug!(
        request_id = %request_id_of(&req),
        path = %req.uri().path(),
        target = %target,
        locale = %route.locale,
        source = route.source.as_str(),
        action = route.kind.as_str(),
        experiment = route.experiment,
        "Routing decision"
    );

    let sync = plan_cookie_sync(prior_locale.as_deref(), prior_user_id.as_deref(), &route.locale);

    let mut response = match route.kind {
        RouteKind::Rewrite => {
            let Some(uri) = rewrite_uri(req.uri(), &target) else {
                tracing::warn!(target = %target, "Rewrite target is not a valid URI");
                return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
            };
            *req.uri_mut() = uri;

            let user_id = prior_user_id
                .filter(|id| !id.is_empty())
                .or_else(|| sync.set_user_id.clone())
                .unwrap_or_default();
            req.extensions_mut().insert(Visitor {
                locale: route.locale.clone(),
                user_id,
                experiment: route.experiment,
            });

            next.run(req).await
        }
        RouteKind::Redirect => Redirect::temporary(&target).into_response(),
    };

    apply_cookie_sync(response.headers_mut(), &state.cookies, &sync);
    response
}

/// Replace path and query, keeping scheme and authority.
fn rewrite_uri(uri: &Uri, target: &str) -> Option<Uri> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(target.parse::<PathAndQuery>().ok()?);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_uri_keeps_authority() {
        let uri: Uri = "http://example.com/about?x=1".parse().unwrap();
        let rewritten = rewrite_uri(&uri, "/en/about?x=1").unwrap();
        assert_eq!(rewritten.to_string(), "http://example.com/en/about?x=1");

        let uri: Uri = "/about".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "/es/about").unwrap().to_string(), "/es/about");
    }
}
