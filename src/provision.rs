use crate::config::DEFAULT_API_URL;
use crate::error::Error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

pub const DEFAULT_DATABASE_API_URL: &str = "https://api.baserow.io/api/database";

#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub votes: i64,
    pub options: i64,
    pub responses: i64,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

/// Creates the votes, options and responses tables in one Baserow database.
pub struct Provisioner {
    http: Client,
    api_url: String,
    token: String,
    database_id: String,
}

impl Provisioner {
    pub fn new(api_url: &str, token: &str, database_id: &str) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().user_agent("anonvote").build()?,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            database_id: database_id.to_owned(),
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Created, Error> {
        let resp = self
            .http
            .post(url)
            .header("Authorization", format!("Token {}", self.token))
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn create_table(&self, name: &str) -> Result<i64, Error> {
        let url = format!("{}/tables/database/{}/", self.api_url, self.database_id);
        let table = self.post(&url, &json!({ "name": name, "data": [] })).await?;
        log::info!("{} table created with id {}", name, table.id);
        Ok(table.id)
    }

    /// Field failures are logged and skipped so the remaining fields still get created.
    async fn create_fields(&self, table_id: i64, fields: Vec<Value>) {
        let url = format!("{}/fields/table/{}/", self.api_url, table_id);
        for field in fields {
            let name = field["name"].as_str().unwrap_or_default().to_owned();
            match self.post(&url, &field).await {
                Ok(_) => log::info!("  field '{}' created", name),
                Err(e) => log::error!("  failed to create field '{}': {}", name, e),
            }
        }
    }

    pub async fn run(&self) -> Result<Tables, Error> {
        let votes = self.create_table("Votes").await?;
        self.create_fields(votes, vote_fields()).await;
        let options = self.create_table("Options").await?;
        self.create_fields(options, option_fields(votes)).await;
        let responses = self.create_table("Responses").await?;
        self.create_fields(responses, response_fields(votes)).await;
        Ok(Tables { votes, options, responses })
    }
}

fn vote_fields() -> Vec<Value> {
    vec![
        json!({ "name": "question", "type": "text" }),
        json!({ "name": "max_selections", "type": "number", "number_decimal_places": 0 }),
        json!({ "name": "created_at", "type": "date", "date_include_time": true }),
        json!({ "name": "uuid", "type": "text" }),
    ]
}

fn option_fields(votes_table: i64) -> Vec<Value> {
    vec![
        json!({ "name": "vote", "type": "link_row", "link_row_table_id": votes_table }),
        json!({ "name": "option_text", "type": "text" }),
        json!({ "name": "count", "type": "number", "number_decimal_places": 0, "number_negative": false }),
    ]
}

fn response_fields(votes_table: i64) -> Vec<Value> {
    vec![
        json!({ "name": "vote", "type": "link_row", "link_row_table_id": votes_table }),
        json!({ "name": "selected_options", "type": "long_text" }),
        json!({ "name": "submitted_at", "type": "date", "date_include_time": true }),
    ]
}

#[derive(Debug, Serialize)]
struct Secrets<'a> {
    baserow_api_token: &'a str,
    votes_table_id: String,
    options_table_id: String,
    responses_table_id: String,
    baserow_api_url: &'a str,
}

pub fn render_secrets(token: &str, rows_api_url: Option<&str>, tables: &Tables) -> Result<String, Error> {
    let secrets = Secrets {
        baserow_api_token: token,
        votes_table_id: tables.votes.to_string(),
        options_table_id: tables.options.to_string(),
        responses_table_id: tables.responses.to_string(),
        baserow_api_url: rows_api_url.unwrap_or(DEFAULT_API_URL),
    };
    let body = toml::to_string(&secrets).map_err(|e| Error::Config(e.to_string()))?;
    Ok(format!("# Baserow API configuration\n{}", body))
}

pub fn write_secrets(path: &Path, contents: &str) -> Result<(), Error> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, contents)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
