//! Gatekeeper server library.
//!
//! Serves the application routes behind the global rate limiter, either for the binary or for the
//! integration tests.

#![deny(missing_docs)]

mod health;
mod rate_limit;

use std::{net::SocketAddr, sync::Arc};

use ::rate_limit::{ConfigurationError, TokenBucket};
use anyhow::anyhow;
use axum::Router;
use config::Config;
use tokio::net::TcpListener;

pub use self::rate_limit::{RateLimitLayer, RateLimitService};

/// Configuration for serving Gatekeeper.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to.
    pub listen_address: SocketAddr,
    /// The deserialized Gatekeeper TOML configuration.
    pub config: Config,
    /// Application routes. Every request to them first has to get past the rate limiter.
    pub routes: Router,
}

/// Starts and runs the Gatekeeper server with the provided configuration.
///
/// Fails before binding anything if the rate limit configuration is invalid.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        routes,
    }: ServeConfig,
) -> anyhow::Result<()> {
    if !routes.has_routes() {
        log::warn!("Server starting with no application routes, only the health endpoint will respond.");
    }

    let mut app = gate(&config, routes)?;

    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            let health_config = config.server.health.clone();

            tokio::spawn(async move {
                if let Err(e) = health::bind_health_endpoint(listen, health_config).await {
                    log::error!("{e}");
                }
            });
        } else {
            app = app.merge(health::router(&config.server.health));
        }
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    log::info!("Gatekeeper listening at http://{listen_address}");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    Ok(())
}

/// Puts the application routes behind the rate limiter, if rate limiting is enabled.
fn gate(config: &Config, routes: Router) -> Result<Router, ConfigurationError> {
    let rate_limit = &config.server.rate_limit;

    if !rate_limit.enabled {
        log::debug!("Rate limiting disabled, requests are not gated");
        return Ok(routes);
    }

    let bucket = TokenBucket::from_config(rate_limit)?;

    log::info!(
        "Rate limiting enabled: bursts of up to {} requests, one token every {:?}",
        bucket.capacity(),
        bucket.refill_interval()
    );

    Ok(routes.layer(RateLimitLayer::new(Arc::new(bucket))))
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, routing::get};
    use http::{Request, StatusCode};
    use indoc::indoc;
    use tower::ServiceExt;

    use super::gate;

    fn routes() -> Router {
        Router::new().route("/inventory", get(|| async { "[]" }))
    }

    async fn statuses(app: Router, count: usize) -> Vec<u16> {
        let mut statuses = Vec::with_capacity(count);

        for _ in 0..count {
            let request = Request::get("/inventory").body(Body::empty()).unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status().as_u16());
        }

        statuses
    }

    #[tokio::test]
    async fn gated_when_enabled() {
        let config = toml::from_str(indoc! {r#"
            [server.rate_limit]
            capacity = 3
            refill_interval = "1h"
        "#})
        .unwrap();

        let app = gate(&config, routes()).unwrap();

        insta::assert_debug_snapshot!(statuses(app, 4).await, @r"
        [
            200,
            200,
            200,
            429,
        ]
        ");
    }

    #[tokio::test]
    async fn not_gated_when_disabled() {
        let config = toml::from_str(indoc! {r#"
            [server.rate_limit]
            enabled = false
            capacity = 1
        "#})
        .unwrap();

        let app = gate(&config, routes()).unwrap();

        assert!(statuses(app, 10).await.iter().all(|status| *status == StatusCode::OK.as_u16()));
    }

    #[test]
    fn invalid_configuration_is_fatal() {
        let config = toml::from_str(indoc! {r#"
            [server.rate_limit]
            capacity = 0
        "#})
        .unwrap();

        let error = gate(&config, routes()).unwrap_err();
        insta::assert_snapshot!(error, @"Rate limit capacity must be greater than zero");
    }

    #[test]
    fn disabled_configuration_is_not_validated() {
        let config = toml::from_str(indoc! {r#"
            [server.rate_limit]
            enabled = false
            refill_interval = "0s"
        "#})
        .unwrap();

        assert!(gate(&config, routes()).is_ok());
    }
}
