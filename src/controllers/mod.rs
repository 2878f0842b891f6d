pub mod admin;
pub mod plans;
pub mod seats;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(admin::routes())
        .merge(plans::routes())
        .merge(seats::routes())
}
