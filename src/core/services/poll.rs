use crate::core::models::{
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Poll, PollCreate, PollDetail, PollKey},
};
use crate::core::ports::repository::{OptionCommon, PollCommon, ResponseCommon, Store};
use crate::core::tally::tally;
use crate::error::Error;
use chrono::Utc;
use uuid::Uuid;

pub const MAX_OPTIONS: usize = 10;

/// Trims the request and checks it can become a poll. `max_selections` is clamped to the option count.
pub fn validate_create(create: PollCreate) -> Result<PollCreate, Error> {
    let question = create.question.trim().to_owned();
    if question.is_empty() {
        return Err(Error::Validation("Please enter a question".into()));
    }
    let options: Vec<String> = create.options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()).map(str::to_owned).collect();
    if options.len() < 2 {
        return Err(Error::Validation("Please enter at least two options".into()));
    }
    if options.len() > MAX_OPTIONS {
        return Err(Error::Validation(format!("A vote can have at most {} options", MAX_OPTIONS)));
    }
    if create.max_selections == 0 {
        return Err(Error::Validation("Maximum selections must be at least 1".into()));
    }
    let max_selections = create.max_selections.min(options.len() as u32);
    Ok(PollCreate {
        question,
        max_selections,
        options,
    })
}

pub async fn create_poll<S>(store: &S, create: PollCreate) -> Result<PollDetail, Error>
where
    S: Store,
{
    let create = validate_create(create)?;
    let poll = PollCommon::insert(
        store,
        PollInsert {
            public_id: Uuid::new_v4().to_string(),
            question: create.question,
            max_selections: create.max_selections,
            created_at: Utc::now(),
        },
    )
    .await?;
    let mut options = Vec::with_capacity(create.options.len());
    for text in create.options {
        match OptionCommon::insert(store, OptionInsert { poll_id: poll.id, text }).await {
            Ok(opt) => options.push(opt),
            Err(e) => {
                log::error!("poll {} ({}) left with {} options after failed option insert: {}", poll.id, poll.public_id, options.len(), e);
                return Err(e);
            }
        }
    }
    log::info!("created poll {} ({}) with {} options", poll.id, poll.public_id, options.len());
    Ok(PollDetail {
        results: tally(&options),
        poll,
        options,
        responses: 0,
    })
}

pub async fn list_polls<S>(store: &S) -> Result<Vec<Poll>, Error>
where
    S: Store,
{
    let mut polls = PollCommon::query(store).await?;
    polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(polls)
}

pub async fn find_poll<S>(store: &S, key: &PollKey) -> Result<Poll, Error>
where
    S: Store,
{
    PollCommon::get(store, key).await?.ok_or_else(|| Error::NotFound("Vote".into()))
}

pub async fn poll_options<S>(store: &S, poll_id: i64) -> Result<Vec<Opt>, Error>
where
    S: Store,
{
    let mut options = OptionCommon::query(store, poll_id).await?;
    options.sort_by_key(|o| o.id);
    Ok(options)
}

/// Loads a poll with its options. Option counts and results are taken from the response log;
/// the counts stored on the option rows are not read here.
pub async fn poll_detail<S>(store: &S, key: &PollKey) -> Result<PollDetail, Error>
where
    S: Store,
{
    let poll = find_poll(store, key).await?;
    let responses = ResponseCommon::query(store, poll.id).await?;
    let options: Vec<Opt> = poll_options(store, poll.id)
        .await?
        .into_iter()
        .map(|mut o| {
            o.count = responses.iter().filter(|r| r.selects(o.id)).count() as u64;
            o
        })
        .collect();
    Ok(PollDetail {
        results: tally(&options),
        poll,
        options,
        responses: responses.len(),
    })
}
