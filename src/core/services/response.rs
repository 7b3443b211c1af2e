use crate::core::models::{
    option::{index, Opt},
    poll::{Poll, PollKey},
    response::{Insert as ResponseInsert, Response, Submit},
};
use crate::core::ports::repository::{OptionCommon, ResponseCommon, Store};
use crate::core::services::poll::{find_poll, poll_options};
use crate::error::Error;
use chrono::Utc;

/// Returns the de-duplicated selection if it is acceptable for `poll`.
pub fn validate_selection(poll: &Poll, opts: &[Opt], option_ids: &[i64]) -> Result<Vec<i64>, Error> {
    let mut selected = option_ids.to_vec();
    selected.sort_unstable();
    selected.dedup();
    if selected.is_empty() {
        return Err(Error::Validation("Please select at least one option".into()));
    }
    if selected.len() > poll.max_selections as usize {
        return Err(Error::Validation(format!("You can select at most {} options", poll.max_selections)));
    }
    let opts = index(opts);
    if let Some(id) = selected.iter().find(|id| !opts.contains_key(*id)) {
        return Err(Error::Validation(format!("Option {} does not belong to this vote", id)));
    }
    Ok(selected)
}

/// Records one response, then rewrites the count of every selected option from the response log.
///
/// The stored counts are a cache. Two votes that read the log before either writes can leave a
/// stale count behind; `poll_detail` recounts from the log and never reads them.
pub async fn cast_vote<S>(store: &S, key: &PollKey, submit: Submit) -> Result<Response, Error>
where
    S: Store,
{
    let poll = find_poll(store, key).await?;
    let opts = poll_options(store, poll.id).await?;
    let selected = match validate_selection(&poll, &opts, &submit.option_ids) {
        Ok(selected) => selected,
        Err(e) => {
            log::warn!("rejected vote for poll {}: {}", poll.id, e);
            return Err(e);
        }
    };
    let recorded = ResponseCommon::insert(
        store,
        ResponseInsert {
            poll_id: poll.id,
            selected: selected.clone(),
            submitted_at: Utc::now(),
        },
    )
    .await?;
    let mut responses = ResponseCommon::query(store, poll.id).await?;
    if !responses.iter().any(|r| r.id == recorded.id) {
        responses.push(recorded.clone());
    }
    for option_id in &selected {
        let count = responses.iter().filter(|r| r.selects(*option_id)).count() as u64;
        if let Err(e) = OptionCommon::update_count(store, *option_id, count).await {
            log::error!("response {} recorded but count of option {} not updated: {}", recorded.id, option_id, e);
            return Err(e);
        }
    }
    log::info!("recorded response {} for poll {} selecting {:?}", recorded.id, poll.id, selected);
    Ok(recorded)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::poll::PollCreate;
    use crate::core::services::poll::{create_poll, poll_detail};
    use crate::core::models::option::Insert as OptionInsert;
    use crate::core::models::poll::{Insert as PollInsert, Poll};
    use crate::core::ports::repository::PollCommon;
    use crate::impls::memory::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Holds the first count write until the second one has landed.
    #[derive(Default)]
    struct Interleaved {
        inner: MemoryStore,
        writes: AtomicUsize,
        release: Notify,
    }

    impl PollCommon for Interleaved {
        async fn insert(&self, data: PollInsert) -> Result<Poll, Error> {
            PollCommon::insert(&self.inner, data).await
        }

        async fn query(&self) -> Result<Vec<Poll>, Error> {
            PollCommon::query(&self.inner).await
        }

        async fn get(&self, key: &PollKey) -> Result<Option<Poll>, Error> {
            PollCommon::get(&self.inner, key).await
        }
    }

    impl OptionCommon for Interleaved {
        async fn insert(&self, option: OptionInsert) -> Result<Opt, Error> {
            OptionCommon::insert(&self.inner, option).await
        }

        async fn query(&self, poll_id: i64) -> Result<Vec<Opt>, Error> {
            OptionCommon::query(&self.inner, poll_id).await
        }

        async fn update_count(&self, id: i64, count: u64) -> Result<(), Error> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                self.release.notified().await;
            }
            OptionCommon::update_count(&self.inner, id, count).await?;
            if n == 1 {
                self.release.notify_one();
            }
            Ok(())
        }
    }

    impl ResponseCommon for Interleaved {
        async fn insert(&self, response: ResponseInsert) -> Result<Response, Error> {
            ResponseCommon::insert(&self.inner, response).await
        }

        async fn query(&self, poll_id: i64) -> Result<Vec<Response>, Error> {
            ResponseCommon::query(&self.inner, poll_id).await
        }
    }

    impl Store for Interleaved {}

    async fn lunch<S: Store>(store: &S, max_selections: u32) -> (PollKey, Vec<Opt>) {
        let detail = create_poll(
            store,
            PollCreate {
                question: "Lunch?".into(),
                max_selections,
                options: vec!["Pizza".into(), "Tacos".into(), "Salad".into()],
            },
        )
        .await
        .unwrap();
        (PollKey::Public(detail.poll.public_id), detail.options)
    }

    #[tokio::test]
    async fn test_single_select_vote() {
        let store = MemoryStore::new();
        let (key, opts) = lunch(&store, 1).await;
        let pizza = opts[0].id;
        let response = cast_vote(&store, &key, Submit { option_ids: vec![pizza] }).await.unwrap();
        assert_eq!(response.selected, vec![pizza]);

        let detail = poll_detail(&store, &key).await.unwrap();
        assert_eq!(detail.options[0].count, 1);
        assert_eq!(detail.options[1].count, 0);
        assert_eq!(detail.results[0].label, "100.0%");
        assert_eq!(detail.results[1].label, "0.0%");
        assert_eq!(detail.responses, 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized() {
        let store = MemoryStore::new();
        let (key, opts) = lunch(&store, 1).await;
        let empty = cast_vote(&store, &key, Submit { option_ids: vec![] }).await;
        assert!(matches!(empty, Err(Error::Validation(_))));
        let two = cast_vote(&store, &key, Submit { option_ids: vec![opts[0].id, opts[1].id] }).await;
        assert!(matches!(two, Err(Error::Validation(_))));

        let detail = poll_detail(&store, &key).await.unwrap();
        assert_eq!(detail.responses, 0);
        assert!(detail.options.iter().all(|o| o.count == 0));
    }

    #[tokio::test]
    async fn test_rejects_foreign_option() {
        let store = MemoryStore::new();
        let (key, _) = lunch(&store, 2).await;
        let (_, other) = lunch(&store, 2).await;
        let res = cast_vote(&store, &key, Submit { option_ids: vec![other[0].id] }).await;
        assert!(matches!(res, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_multi_select_counts() {
        let store = MemoryStore::new();
        let (key, opts) = lunch(&store, 2).await;
        cast_vote(&store, &key, Submit { option_ids: vec![opts[0].id, opts[1].id] }).await.unwrap();
        cast_vote(&store, &key, Submit { option_ids: vec![opts[1].id, opts[1].id] }).await.unwrap();
        cast_vote(&store, &key, Submit { option_ids: vec![opts[2].id] }).await.unwrap();

        let detail = poll_detail(&store, &key).await.unwrap();
        let counts: Vec<u64> = detail.options.iter().map(|o| o.count).collect();
        assert_eq!(counts, vec![1, 2, 1]);
        let sum: f64 = detail.results.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_concurrent_votes_are_all_counted() {
        let store = Interleaved::default();
        let (key, opts) = lunch(&store, 1).await;
        let pizza = opts[0].id;
        let (first, second) = tokio::join!(
            cast_vote(&store, &key, Submit { option_ids: vec![pizza] }),
            cast_vote(&store, &key, Submit { option_ids: vec![pizza] }),
        );
        first.unwrap();
        second.unwrap();

        // the first vote read the log before the second was recorded and wrote last
        let cached = OptionCommon::query(&store.inner, opts[0].poll_id).await.unwrap();
        assert_eq!(cached.iter().find(|o| o.id == pizza).unwrap().count, 1);

        let detail = poll_detail(&store, &key).await.unwrap();
        assert_eq!(detail.responses, 2);
        assert_eq!(detail.options[0].count, 2);
        assert_eq!(detail.results[0].votes, 2);
        assert_eq!(detail.results[0].label, "100.0%");
    }

    #[tokio::test]
    async fn test_vote_on_missing_poll() {
        let store = MemoryStore::new();
        let res = cast_vote(&store, &PollKey::Id(404), Submit { option_ids: vec![1] }).await;
        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_validate_dedups() {
        let poll = Poll {
            id: 1,
            public_id: "p".into(),
            question: "q".into(),
            max_selections: 1,
            created_at: None,
        };
        let opts = vec![Opt {
            id: 5,
            poll_id: 1,
            text: "a".into(),
            count: 0,
        }];
        assert_eq!(validate_selection(&poll, &opts, &[5, 5]).unwrap(), vec![5]);
    }
}
