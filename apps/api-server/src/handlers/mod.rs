//! HTTP handlers and route configuration.

/// Build a test service over the full route table.
#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| crate::handlers::configure_routes(cfg, &$state)),
        )
        .await
    };
}

mod auth;
mod health;
mod todos;

use actix_web::middleware::Condition;
use actix_web::web;

use crate::middleware::auth::RequireAuth;
use crate::middleware::error::{json_error_handler, query_error_handler};
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                // Auth routes
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .service(
                            web::resource("/me")
                                .wrap(RequireAuth::new(state))
                                .route(web::get().to(auth::me)),
                        ),
                )
                // Todo routes; gated only when TODOS_REQUIRE_AUTH is set
                .service(
                    web::scope("/todos")
                        .wrap(Condition::new(
                            state.todos_require_auth,
                            RequireAuth::new(state),
                        ))
                        .route("", web::post().to(todos::create))
                        .route("", web::get().to(todos::list))
                        .route("/{id}", web::get().to(todos::get_by_id))
                        .route("/{id}", web::put().to(todos::update))
                        .route("/{id}", web::delete().to(todos::delete)),
                ),
        );
}
