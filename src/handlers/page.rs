use crate::core::models::poll::PollKey;
use crate::core::ports::repository::Store;
use crate::core::services::{poll as poll_service, response as response_service};
use crate::error::Error;
use crate::handlers::Site;
use crate::render::{self, Notice};
use crate::request::{parse_vote_form, CreatePollForm};
use crate::session::View;
use actix_web::http::{header, StatusCode};
use actix_web::web::{Bytes, Data, Path};
use actix_web::{HttpResponse, ResponseError};
use url::form_urlencoded;

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status).content_type("text/html; charset=utf-8").body(body)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, location)).finish()
}

fn failure_notice(e: &Error) -> Notice {
    match e {
        Error::Validation(msg) => Notice::Warning(msg.clone()),
        Error::NotFound(what) => Notice::Error(format!("{} not found", what)),
        _ => Notice::Error(format!("Request to the vote store failed: {}", e)),
    }
}

async fn listing<S>(store: &S, form: Option<&CreatePollForm>, form_notices: &[Notice], status: StatusCode) -> HttpResponse
where
    S: Store,
{
    match poll_service::list_polls(store).await {
        Ok(polls) => html(status, render::listing_page(&polls, form, &[], form_notices)),
        Err(e) => {
            let notice = Notice::Error(format!("Failed to fetch votes: {}", e));
            html(e.status_code(), render::listing_page(&[], form, &[notice], form_notices))
        }
    }
}

async fn detail<S>(store: &S, site: &Site, key: &PollKey, notices: &[Notice], status: StatusCode) -> HttpResponse
where
    S: Store,
{
    match poll_service::poll_detail(store, key).await {
        Ok(detail) => html(status, render::poll_page(&detail, &site.public_url, notices)),
        Err(e) => html(e.status_code(), render::message_page("Anonymous Vote", &[failure_notice(&e)])),
    }
}

pub async fn index<S: Store + 'static>(view: View, store: Data<S>, site: Data<Site>) -> HttpResponse {
    match view {
        View::Listing => listing(store.get_ref(), None, &[], StatusCode::OK).await,
        View::CreateFormOpen => listing(store.get_ref(), Some(&CreatePollForm::default()), &[], StatusCode::OK).await,
        View::PollDetail { key, submitted } => {
            let notices = if submitted {
                vec![Notice::Success("Your vote has been recorded!".into())]
            } else {
                Vec::new()
            };
            detail(store.get_ref(), &site, &key, &notices, StatusCode::OK).await
        }
    }
}

pub async fn create<S: Store + 'static>(store: Data<S>, body: Bytes) -> HttpResponse {
    let form = CreatePollForm::parse(&body);
    let created = match form.to_create() {
        Ok(create) => poll_service::create_poll(store.get_ref(), create).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(_) => see_other("/"),
        Err(e) => {
            if e.is_validation() {
                log::warn!("rejected poll creation: {}", e);
            }
            listing(store.get_ref(), Some(&form), &[failure_notice(&e)], e.status_code()).await
        }
    }
}

pub async fn vote<S: Store + 'static>(store: Data<S>, site: Data<Site>, key: Path<(String,)>, body: Bytes) -> HttpResponse {
    let key = PollKey::parse(&key.into_inner().0);
    let recorded = match parse_vote_form(&body) {
        Ok(submit) => response_service::cast_vote(store.get_ref(), &key, submit).await,
        Err(e) => Err(e),
    };
    match recorded {
        Ok(_) => {
            let vote_id: String = form_urlencoded::byte_serialize(key.to_string().as_bytes()).collect();
            see_other(&format!("/?vote_id={}&submitted=1", vote_id))
        }
        Err(e @ Error::NotFound(_)) => html(e.status_code(), render::message_page("Anonymous Vote", &[failure_notice(&e)])),
        Err(e) => detail(store.get_ref(), &site, &key, &[failure_notice(&e)], e.status_code()).await,
    }
}
