use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::rate_limit;
use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod validation;

pub fn router(state: &AppState) -> Router<AppState> {
    // The create route carries its own budget and a body cap slightly above
    // the 5MB image limit to leave room for the text fields.
    let create = Router::new()
        .route("/", post(handlers::create_ad))
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::upload_guard,
        ));

    Router::new()
        .route("/", get(handlers::list_ads))
        .route("/my-ads", get(handlers::my_ads))
        .route(
            "/:id",
            get(handlers::get_ad)
                .put(handlers::update_ad)
                .delete(handlers::delete_ad),
        )
        .merge(create)
}
