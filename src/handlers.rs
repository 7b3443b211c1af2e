pub mod api;
pub mod page;

use crate::core::ports::repository::Store;
use actix_web::web::{get, post, resource, scope, ServiceConfig};
use actix_web::HttpResponse;

/// Public base URL used to build share links.
#[derive(Debug, Clone)]
pub struct Site {
    pub public_url: String,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub fn configure<S>(cfg: &mut ServiceConfig)
where
    S: Store + 'static,
{
    cfg.service(resource("/").route(get().to(page::index::<S>)))
        .service(resource("/health").route(get().to(health)))
        .service(resource("/polls").route(post().to(page::create::<S>)))
        .service(resource("/polls/{key}/responses").route(post().to(page::vote::<S>)))
        .service(
            scope("/api/polls")
                .route("", get().to(api::list::<S>))
                .route("", post().to(api::create::<S>))
                .route("/{key}", get().to(api::detail::<S>))
                .route("/{key}/results", get().to(api::results::<S>))
                .route("/{key}/responses", post().to(api::vote::<S>)),
        );
}
