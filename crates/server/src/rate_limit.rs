//! Rate limiting middleware for HTTP requests.

use std::{
    future::{Future, ready},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    Json,
    body::Body,
    response::{IntoResponse, Response},
};
use http::{Request, StatusCode};
use ::rate_limit::{Clock, SystemClock, TokenBucket};
use serde_json::json;
use tower::Layer;

/// Gates every request behind a shared [`TokenBucket`].
///
/// Admitted requests go to the inner service untouched. Rejected requests get an immediate
/// `429 Too Many Requests` and never reach it.
pub struct RateLimitLayer<C = SystemClock>(Arc<TokenBucket<C>>);

impl<C> RateLimitLayer<C> {
    /// Create a layer drawing tokens from `bucket`.
    pub fn new(bucket: Arc<TokenBucket<C>>) -> Self {
        Self(bucket)
    }
}

impl<C> Clone for RateLimitLayer<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Service, C> Layer<Service> for RateLimitLayer<C>
where
    Service: Send + Clone,
{
    type Service = RateLimitService<Service, C>;

    fn layer(&self, next: Service) -> Self::Service {
        RateLimitService {
            next,
            bucket: self.0.clone(),
        }
    }
}

/// The service produced by [`RateLimitLayer`].
pub struct RateLimitService<Service, C = SystemClock> {
    next: Service,
    bucket: Arc<TokenBucket<C>>,
}

impl<Service: Clone, C> Clone for RateLimitService<Service, C> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            bucket: self.bucket.clone(),
        }
    }
}

impl<Service, ReqBody, C> tower::Service<Request<ReqBody>> for RateLimitService<Service, C>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Send + 'static,
    ReqBody: http_body::Body + Send + 'static,
    C: Clock + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if !self.bucket.allow() {
            log::debug!("Request {} {} rejected by the rate limiter", req.method(), req.uri().path());
            return Box::pin(ready(Ok(too_many_requests())));
        }

        // Keep the service that was polled ready and leave a fresh clone behind.
        let clone = self.next.clone();
        let mut next = std::mem::replace(&mut self.next, clone);

        Box::pin(async move { next.call(req).await })
    }
}

fn too_many_requests() -> Response<Body> {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "Too many requests" })),
    )
        .into_response()
}
