mod config;
mod core;
mod error;
mod handlers;
mod impls;
mod provision;
mod render;
mod request;
mod response;
mod session;

use actix_web::web::Data;
use actix_web::{App, HttpServer};
use clap::{Parser, Subcommand};
use crate::config::{ServerConfig, Source, StoreConfig, DEFAULT_SECRETS_PATH, SECRETS_PATH_VAR};
use crate::core::ports::repository::Store;
use crate::handlers::Site;
use crate::impls::{baserow::BaserowStore, memory::MemoryStore};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "anonvote", about = "Anonymous polls backed by Baserow tables")]
struct Cli {
    /// Secrets file with the Baserow token and table ids.
    #[arg(long, env = SECRETS_PATH_VAR, default_value = DEFAULT_SECRETS_PATH, global = true)]
    secrets: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the voting site (default).
    Serve {
        /// Keep polls in process memory instead of Baserow.
        #[arg(long)]
        memory: bool,
    },
    /// Create the Baserow tables and write their ids to the secrets file.
    Provision {
        #[arg(long, env = "BASEROW_DATABASE_ID")]
        database_id: String,
        #[arg(long, env = "BASEROW_DATABASE_API_URL", default_value = provision::DEFAULT_DATABASE_API_URL)]
        database_api_url: String,
    },
}

async fn serve<S>(store: S, server: ServerConfig) -> std::io::Result<()>
where
    S: Store + Send + Sync + 'static,
{
    let store = Data::new(store);
    let site = Data::new(Site {
        public_url: server.public_url.clone(),
    });
    log::info!("listening on {}, share links use {}", server.bind_address, server.public_url);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(store.clone())
            .app_data(site.clone())
            .configure(handlers::configure::<S>)
    })
    .bind(server.bind_address.as_str())?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("actix_web=info,anonvote=info")).init();
    let cli = Cli::parse();
    let source = Source::load(&cli.secrets)?;
    match cli.command.unwrap_or(Command::Serve { memory: false }) {
        Command::Serve { memory: true } => {
            log::warn!("using in-memory store, polls are lost on exit");
            serve(MemoryStore::new(), ServerConfig::from_source(&source)).await?;
        }
        Command::Serve { memory: false } => {
            let store = BaserowStore::new(&StoreConfig::from_source(&source)?)?;
            serve(store, ServerConfig::from_source(&source)).await?;
        }
        Command::Provision {
            database_id,
            database_api_url,
        } => {
            let token = source
                .get("baserow_api_token")
                .ok_or_else(|| anyhow::anyhow!("BASEROW_API_TOKEN is not set"))?;
            let tables = provision::Provisioner::new(&database_api_url, &token, &database_id)?.run().await?;
            let rows_api_url = source.get("baserow_api_url");
            let secrets = provision::render_secrets(&token, rows_api_url.as_deref(), &tables)?;
            provision::write_secrets(&cli.secrets, &secrets)?;
            println!("Setup completed: votes={} options={} responses={}", tables.votes, tables.options, tables.responses);
        }
    }
    Ok(())
}
