use crate::core::models::poll::PollKey;
use actix_web::dev::Payload;
use actix_web::web::Query;
use actix_web::{Error, FromRequest, HttpRequest};
use serde::Deserialize;
use std::future::{ready, Ready};

#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    create: Option<String>,
    vote_id: Option<String>,
    submitted: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some(v) if v != "0" && !v.eq_ignore_ascii_case("false"))
}

/// What the current browser session is looking at, carried in the query string of `/`.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Listing,
    CreateFormOpen,
    PollDetail { key: PollKey, submitted: bool },
}

impl View {
    fn from_query(query: ViewQuery) -> Self {
        match query.vote_id.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(vote_id) => View::PollDetail {
                key: PollKey::parse(vote_id),
                submitted: flag(&query.submitted),
            },
            None if flag(&query.create) => View::CreateFormOpen,
            None => View::Listing,
        }
    }
}

impl FromRequest for View {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let query = Query::<ViewQuery>::from_query(req.query_string()).map(Query::into_inner).unwrap_or_default();
        ready(Ok(View::from_query(query)))
    }
}
