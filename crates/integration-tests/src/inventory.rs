//! A stand-in for the record-management routes the server gates.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Serves `GET /inventory` and counts how many requests reached it.
#[derive(Clone, Default)]
pub struct InventoryStub {
    hits: Arc<AtomicUsize>,
}

impl InventoryStub {
    /// Number of requests that made it past the rate limiter.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn router(&self) -> Router {
        let hits = self.hits.clone();

        Router::new().route(
            "/inventory",
            get(move || {
                let hits = hits.clone();

                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(items())
                }
            }),
        )
    }
}

fn items() -> Value {
    json!([
        { "id": "5b1f4c1e-8a5e-4a53-9a55-1f0f6e0d2c11", "name": "Laptop", "stock": 10, "price": 999.99 },
        { "id": "0c7d1a8e-2f0b-4f6a-8f41-6b9f6f2a9b07", "name": "Mouse", "stock": 30, "price": 49.99 },
    ])
}
