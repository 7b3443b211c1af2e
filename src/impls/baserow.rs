use crate::config::StoreConfig;
use crate::core::models::{
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Poll, PollKey},
    response::{Insert as ResponseInsert, Response},
};
use crate::core::ports::repository::{OptionCommon, PollCommon, ResponseCommon, Store};
use crate::error::Error;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PAGE_SIZE: &str = "200";

/// Row store backed by three Baserow tables: votes, options and responses.
#[derive(Debug, Clone)]
pub struct BaserowStore {
    http: Client,
    api_url: String,
    token: String,
    votes_table: String,
    options_table: String,
    responses_table: String,
}

impl BaserowStore {
    pub fn new(config: &StoreConfig) -> Result<Self, Error> {
        let http = Client::builder().timeout(config.timeout).user_agent("anonvote").build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            votes_table: config.votes_table.clone(),
            options_table: config.options_table.clone(),
            responses_table: config.responses_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}{}/", self.api_url, table)
    }

    fn row_url(&self, table: &str, row: i64) -> String {
        format!("{}{}/{}/", self.api_url, table, row)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Token {}", self.token)).query(&[("user_field_names", "true")])
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        log::error!("remote store returned {}: {}", status, body);
        Err(Error::Remote {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetches every row of `table` matching `filters`, following the `next` links.
    async fn list<R>(&self, table: &str, filters: &[(String, String)]) -> Result<Vec<R>, Error>
    where
        R: DeserializeOwned,
    {
        let url = self.table_url(table);
        log::debug!("GET {} {:?}", url, filters);
        let first = self.authorized(self.http.get(&url)).query(filters).query(&[("size", PAGE_SIZE)]);
        let mut page: Page<R> = self.send(first).await?.json().await?;
        let mut rows = std::mem::take(&mut page.results);
        while let Some(next) = page.next.take() {
            log::debug!("GET {}", next);
            let request = self.http.get(&next).header("Authorization", format!("Token {}", self.token));
            page = self.send(request).await?.json().await?;
            rows.append(&mut page.results);
        }
        Ok(rows)
    }

    async fn create<B, R>(&self, table: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.table_url(table);
        log::debug!("POST {}", url);
        Ok(self.send(self.authorized(self.http.post(&url)).json(body)).await?.json().await?)
    }
}

impl PollCommon for BaserowStore {
    async fn insert(&self, data: PollInsert) -> Result<Poll, Error> {
        let body = json!({
            "question": data.question,
            "max_selections": data.max_selections,
            "created_at": data.created_at.to_rfc3339(),
            "uuid": data.public_id,
        });
        let row: PollRow = self.create(&self.votes_table, &body).await?;
        Ok(row.into())
    }

    async fn query(&self) -> Result<Vec<Poll>, Error> {
        let rows: Vec<PollRow> = self.list(&self.votes_table, &[]).await?;
        Ok(rows.into_iter().map(Poll::from).collect())
    }

    async fn get(&self, key: &PollKey) -> Result<Option<Poll>, Error> {
        match key {
            PollKey::Id(id) => {
                let url = self.row_url(&self.votes_table, *id);
                log::debug!("GET {}", url);
                match self.send(self.authorized(self.http.get(&url))).await {
                    Ok(resp) => Ok(Some(resp.json::<PollRow>().await?.into())),
                    Err(Error::Remote { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
                    Err(e) => Err(e),
                }
            }
            PollKey::Public(public_id) => {
                let rows: Vec<PollRow> = self.list(&self.votes_table, &[equal("uuid", public_id)]).await?;
                Ok(rows.into_iter().next().map(Poll::from))
            }
        }
    }
}

impl OptionCommon for BaserowStore {
    async fn insert(&self, option: OptionInsert) -> Result<Opt, Error> {
        let body = json!({
            "vote": [option.poll_id],
            "option_text": option.text,
            "count": 0,
        });
        let row: OptionRow = self.create(&self.options_table, &body).await?;
        Ok(row.into_opt(option.poll_id))
    }

    async fn query(&self, poll_id: i64) -> Result<Vec<Opt>, Error> {
        let rows: Vec<OptionRow> = self.list(&self.options_table, &[link_has("vote", poll_id)]).await?;
        Ok(rows.into_iter().map(|r| r.into_opt(poll_id)).collect())
    }

    async fn update_count(&self, id: i64, count: u64) -> Result<(), Error> {
        let url = self.row_url(&self.options_table, id);
        log::debug!("PATCH {} count={}", url, count);
        self.send(self.authorized(self.http.patch(&url)).json(&json!({ "count": count }))).await?;
        Ok(())
    }
}

impl ResponseCommon for BaserowStore {
    async fn insert(&self, response: ResponseInsert) -> Result<Response, Error> {
        let body = json!({
            "vote": [response.poll_id],
            "selected_options": serde_json::to_string(&response.selected)?,
            "submitted_at": response.submitted_at.to_rfc3339(),
        });
        let row: ResponseRow = self.create(&self.responses_table, &body).await?;
        Ok(row.into_response(response.poll_id))
    }

    async fn query(&self, poll_id: i64) -> Result<Vec<Response>, Error> {
        let rows: Vec<ResponseRow> = self.list(&self.responses_table, &[link_has("vote", poll_id)]).await?;
        Ok(rows.into_iter().map(|r| r.into_response(poll_id)).collect())
    }
}

impl Store for BaserowStore {}

fn equal(field: &str, value: &str) -> (String, String) {
    (format!("filter__{}__equal", field), value.to_owned())
}

fn link_has(field: &str, row_id: i64) -> (String, String) {
    (format!("filter__{}__link_row_has", field), row_id.to_string())
}

#[derive(Debug, Deserialize)]
struct Page<R> {
    #[serde(default)]
    next: Option<String>,
    results: Vec<R>,
}

/// Baserow serializes number fields as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Number {
    fn value(&self) -> Option<u64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(f) if *f >= 0.0 => Some(f.round() as u64),
            Number::Float(_) => None,
            Number::Text(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinkRef {
    id: i64,
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc()))
        .ok()
}

#[derive(Debug, Deserialize)]
struct PollRow {
    id: i64,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    max_selections: Option<Number>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Poll {
            id: row.id,
            public_id: row.uuid.unwrap_or_default(),
            question: row.question.unwrap_or_default(),
            max_selections: row.max_selections.and_then(|n| n.value()).map(|n| n.clamp(1, u32::MAX as u64) as u32).unwrap_or(1),
            created_at: parse_time(row.created_at.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    id: i64,
    #[serde(default)]
    vote: Vec<LinkRef>,
    #[serde(default)]
    option_text: Option<String>,
    #[serde(default)]
    count: Option<Number>,
}

impl OptionRow {
    fn into_opt(self, poll_id: i64) -> Opt {
        Opt {
            id: self.id,
            poll_id: self.vote.first().map(|l| l.id).unwrap_or(poll_id),
            text: self.option_text.unwrap_or_default(),
            count: self.count.and_then(|n| n.value()).unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseRow {
    id: i64,
    #[serde(default)]
    vote: Vec<LinkRef>,
    #[serde(default)]
    selected_options: Option<String>,
    #[serde(default)]
    submitted_at: Option<String>,
}

impl ResponseRow {
    fn into_response(self, poll_id: i64) -> Response {
        let selected = match self.selected_options.as_deref().map(serde_json::from_str::<Vec<i64>>) {
            Some(Ok(selected)) => selected,
            Some(Err(e)) => {
                log::warn!("response {} has unreadable selected_options: {}", self.id, e);
                Vec::new()
            }
            None => Vec::new(),
        };
        Response {
            id: self.id,
            poll_id: self.vote.first().map(|l| l.id).unwrap_or(poll_id),
            selected,
            submitted_at: parse_time(self.submitted_at.as_deref()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    fn store() -> BaserowStore {
        BaserowStore::new(&StoreConfig {
            api_url: "https://api.baserow.io/api/database/rows/table/".into(),
            token: "t".into(),
            votes_table: "1".into(),
            options_table: "2".into(),
            responses_table: "3".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(store.table_url(&store.options_table), "https://api.baserow.io/api/database/rows/table/2/");
        assert_eq!(store.row_url(&store.options_table, 17), "https://api.baserow.io/api/database/rows/table/2/17/");
        assert_eq!(link_has("vote", 9), ("filter__vote__link_row_has".to_owned(), "9".to_owned()));
        assert_eq!(equal("uuid", "abc"), ("filter__uuid__equal".to_owned(), "abc".to_owned()));
    }

    #[test]
    fn test_poll_row() {
        let row: PollRow = serde_json::from_value(json!({
            "id": 4,
            "order": "1.00000000000000000000",
            "question": "Lunch?",
            "max_selections": "2",
            "created_at": "2024-05-01T12:30:00Z",
            "uuid": "6f1c2a9e-3c4b-4a55-9d4e-0b8f6f2f1a10"
        }))
        .unwrap();
        let poll = Poll::from(row);
        assert_eq!(poll.id, 4);
        assert_eq!(poll.max_selections, 2);
        assert_eq!(poll.public_id, "6f1c2a9e-3c4b-4a55-9d4e-0b8f6f2f1a10");
        assert_eq!(poll.created_at.unwrap().to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_poll_row_naive_time_and_nulls() {
        let row: PollRow = serde_json::from_value(json!({
            "id": 5,
            "question": null,
            "max_selections": null,
            "created_at": "2024-05-01T12:30:00.123456",
            "uuid": null
        }))
        .unwrap();
        let poll = Poll::from(row);
        assert_eq!(poll.max_selections, 1);
        assert_eq!(poll.question, "");
        assert!(poll.created_at.is_some());
    }

    #[test]
    fn test_option_row() {
        let page: Page<OptionRow> = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{ "id": 11, "vote": [{ "id": 4, "value": "Lunch?" }], "option_text": "Pizza", "count": "3" }]
        }))
        .unwrap();
        assert!(page.next.is_none());
        let opt = page.results.into_iter().next().unwrap().into_opt(99);
        assert_eq!(opt.poll_id, 4);
        assert_eq!(opt.text, "Pizza");
        assert_eq!(opt.count, 3);
    }

    #[test]
    fn test_response_row() {
        let row: ResponseRow = serde_json::from_value(json!({
            "id": 21,
            "vote": [],
            "selected_options": "[11, 12]",
            "submitted_at": "2024-05-01T12:31:00Z"
        }))
        .unwrap();
        let response = row.into_response(4);
        assert_eq!(response.poll_id, 4);
        assert_eq!(response.selected, vec![11, 12]);

        let broken: ResponseRow = serde_json::from_value(json!({ "id": 22, "selected_options": "not json" })).unwrap();
        assert!(broken.into_response(4).selected.is_empty());
    }

    /// Serves table 1 as two pages of polls, fails table 2 and has no single rows.
    fn mock_baserow() -> String {
        use actix_web::web::{self, Query};
        use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
        use std::collections::HashMap;

        async fn rows(req: HttpRequest, table: web::Path<(String,)>, query: Query<HashMap<String, String>>) -> HttpResponse {
            if req.headers().get("Authorization").and_then(|v| v.to_str().ok()) != Some("Token t") {
                return HttpResponse::Unauthorized().body("invalid token");
            }
            if query.get("user_field_names").map(String::as_str) != Some("true") {
                return HttpResponse::BadRequest().body("field ids not supported");
            }
            match table.into_inner().0.as_str() {
                "1" if query.get("page").map(String::as_str) == Some("2") => HttpResponse::Ok().json(json!({
                    "next": null,
                    "results": [{ "id": 2, "question": "Dinner?", "max_selections": "1", "uuid": "b" }]
                })),
                "1" => HttpResponse::Ok().json(json!({
                    "next": format!("http://{}/1/?user_field_names=true&page=2", req.connection_info().host()),
                    "results": [{ "id": 1, "question": "Lunch?", "max_selections": "2", "uuid": "a" }]
                })),
                _ => HttpResponse::ServiceUnavailable().body("service unavailable"),
            }
        }

        async fn row() -> HttpResponse {
            HttpResponse::NotFound().json(json!({ "error": "ERROR_ROW_DOES_NOT_EXIST" }))
        }

        let server = HttpServer::new(|| App::new().route("/{table}/", web::get().to(rows)).route("/{table}/{row}/", web::get().to(row)))
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}/", addr)
    }

    fn remote(api_url: String, token: &str) -> BaserowStore {
        BaserowStore::new(&StoreConfig {
            api_url,
            token: token.into(),
            votes_table: "1".into(),
            options_table: "2".into(),
            responses_table: "3".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[actix_web::test]
    async fn test_remote_round_trips() {
        let api_url = mock_baserow();
        let store = remote(api_url.clone(), "t");

        let polls = PollCommon::query(&store).await.unwrap();
        let ids: Vec<i64> = polls.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(polls[0].max_selections, 2);
        assert_eq!(polls[1].question, "Dinner?");

        assert_eq!(PollCommon::get(&store, &PollKey::Id(404)).await.unwrap(), None);

        let err = OptionCommon::query(&store, 1).await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: 503, ref body } if body == "service unavailable"));

        let err = PollCommon::query(&remote(api_url, "wrong")).await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: 401, .. }));
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(Number::Int(3).value(), Some(3));
        assert_eq!(Number::Float(2.0).value(), Some(2));
        assert_eq!(Number::Text("7".into()).value(), Some(7));
        assert_eq!(Number::Text("".into()).value(), None);
        assert_eq!(Number::Float(-1.0).value(), None);
    }
}
