use crate::core::models::{
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Poll, PollKey},
    response::{Insert as ResponseInsert, Response},
};
use crate::core::ports::repository::{OptionCommon, PollCommon, ResponseCommon, Store};
use crate::error::Error;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    polls: Vec<Poll>,
    options: Vec<Opt>,
    responses: Vec<Response>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local store used by `serve --memory` and the test suite. Row ids are shared across tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables.lock().map_err(|_| Error::Unavailable("memory store lock poisoned".into()))
    }
}

impl PollCommon for MemoryStore {
    async fn insert(&self, data: PollInsert) -> Result<Poll, Error> {
        let mut tables = self.lock()?;
        let poll = Poll {
            id: tables.next_id(),
            public_id: data.public_id,
            question: data.question,
            max_selections: data.max_selections,
            created_at: Some(data.created_at),
        };
        tables.polls.push(poll.clone());
        Ok(poll)
    }

    async fn query(&self) -> Result<Vec<Poll>, Error> {
        Ok(self.lock()?.polls.clone())
    }

    async fn get(&self, key: &PollKey) -> Result<Option<Poll>, Error> {
        Ok(self.lock()?.polls.iter().find(|p| key.matches(p)).cloned())
    }
}

impl OptionCommon for MemoryStore {
    async fn insert(&self, option: OptionInsert) -> Result<Opt, Error> {
        let mut tables = self.lock()?;
        let opt = Opt {
            id: tables.next_id(),
            poll_id: option.poll_id,
            text: option.text,
            count: 0,
        };
        tables.options.push(opt.clone());
        Ok(opt)
    }

    async fn query(&self, poll_id: i64) -> Result<Vec<Opt>, Error> {
        Ok(self.lock()?.options.iter().filter(|o| o.poll_id == poll_id).cloned().collect())
    }

    async fn update_count(&self, id: i64, count: u64) -> Result<(), Error> {
        let mut tables = self.lock()?;
        let opt = tables
            .options
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| Error::NotFound(format!("option {}", id)))?;
        opt.count = count;
        Ok(())
    }
}

impl ResponseCommon for MemoryStore {
    async fn insert(&self, response: ResponseInsert) -> Result<Response, Error> {
        let mut tables = self.lock()?;
        let response = Response {
            id: tables.next_id(),
            poll_id: response.poll_id,
            selected: response.selected,
            submitted_at: Some(response.submitted_at),
        };
        tables.responses.push(response.clone());
        Ok(response)
    }

    async fn query(&self, poll_id: i64) -> Result<Vec<Response>, Error> {
        Ok(self.lock()?.responses.iter().filter(|r| r.poll_id == poll_id).cloned().collect())
    }
}

impl Store for MemoryStore {}
