use crate::core::models::poll::{Poll, PollCreate, PollDetail, PollKey};
use crate::core::models::response::{Response, Submit};
use crate::core::ports::repository::Store;
use crate::core::services::{poll as poll_service, response as response_service};
use crate::core::tally::TallyRow;
use crate::error::Error;
use crate::response::List;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;

pub async fn list<S: Store + 'static>(store: Data<S>) -> Result<Json<List<Poll>>, Error> {
    let polls = poll_service::list_polls(store.get_ref()).await?;
    let total = polls.len() as i64;
    Ok(Json(List::new(polls, total)))
}

pub async fn create<S: Store + 'static>(store: Data<S>, Json(create): Json<PollCreate>) -> Result<HttpResponse, Error> {
    let detail = poll_service::create_poll(store.get_ref(), create).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(detail))
}

pub async fn detail<S: Store + 'static>(store: Data<S>, key: Path<(String,)>) -> Result<Json<PollDetail>, Error> {
    let key = PollKey::parse(&key.into_inner().0);
    Ok(Json(poll_service::poll_detail(store.get_ref(), &key).await?))
}

pub async fn results<S: Store + 'static>(store: Data<S>, key: Path<(String,)>) -> Result<Json<Vec<TallyRow>>, Error> {
    let key = PollKey::parse(&key.into_inner().0);
    Ok(Json(poll_service::poll_detail(store.get_ref(), &key).await?.results))
}

pub async fn vote<S: Store + 'static>(store: Data<S>, key: Path<(String,)>, Json(submit): Json<Submit>) -> Result<HttpResponse, Error> {
    let key = PollKey::parse(&key.into_inner().0);
    let response: Response = response_service::cast_vote(store.get_ref(), &key, submit).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(response))
}
