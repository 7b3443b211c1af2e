use crate::core::models::{
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Poll, PollKey},
    response::{Insert as ResponseInsert, Response},
};
use crate::error::Error;

pub trait PollCommon {
    async fn insert(&self, data: PollInsert) -> Result<Poll, Error>;
    async fn query(&self) -> Result<Vec<Poll>, Error>;
    async fn get(&self, key: &PollKey) -> Result<Option<Poll>, Error>;
}

pub trait OptionCommon {
    async fn insert(&self, option: OptionInsert) -> Result<Opt, Error>;
    async fn query(&self, poll_id: i64) -> Result<Vec<Opt>, Error>;
    async fn update_count(&self, id: i64, count: u64) -> Result<(), Error>;
}

pub trait ResponseCommon {
    async fn insert(&self, response: ResponseInsert) -> Result<Response, Error>;
    async fn query(&self, poll_id: i64) -> Result<Vec<Response>, Error>;
}

pub trait Store: PollCommon + OptionCommon + ResponseCommon {}
