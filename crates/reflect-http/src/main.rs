//! `reflect` server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `REFLECT_*` environment variables, opens the SQLite store and the photo
//! directory, and serves the journal API over HTTP.
//!
//! # Seeding users and classrooms
//!
//! ```text
//! reflect add-user --username ms-frizzle --role teacher   # password on stdin
//! reflect add-classroom --title "Science" --teacher ms-frizzle
//! reflect enroll --classroom <uuid> --username arnold
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reflect_core::{Journal, directory::Role};
use reflect_http::{AppState, ServerConfig, assets::DiskAssetStore, auth::hash_password};
use reflect_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Reflection journal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Register a user; the password is read from stdin.
  AddUser {
    #[arg(long)]
    username: String,
    /// `student` or `teacher`.
    #[arg(long)]
    role:     Role,
  },
  /// Create a classroom taught by an existing teacher.
  AddClassroom {
    #[arg(long)]
    title:   String,
    /// Username of the teacher.
    #[arg(long)]
    teacher: String,
  },
  /// Enroll a user as a student of a classroom.
  Enroll {
    #[arg(long)]
    classroom: Uuid,
    #[arg(long)]
    username:  String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit; needs no configuration.
  if let Some(Command::HashPassword) = cli.command {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    None | Some(Command::Serve) => serve(server_cfg, store).await,
    Some(Command::HashPassword) => Ok(()),
    Some(Command::AddUser { username, role }) => {
      let password = read_password()?;
      let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      let user = store
        .add_user(&username, role, &hash)
        .await
        .with_context(|| format!("failed to add user {username}"))?;
      println!("{}", user.user_id);
      Ok(())
    }
    Some(Command::AddClassroom { title, teacher }) => {
      let classroom_id = store
        .add_classroom(&title, &teacher)
        .await
        .with_context(|| format!("failed to add classroom {title:?}"))?;
      println!("{classroom_id}");
      Ok(())
    }
    Some(Command::Enroll { classroom, username }) => {
      let user = store
        .find_user(&username)
        .await?
        .with_context(|| format!("no user named {username}"))?;
      store
        .enroll(classroom, user.user_id)
        .await
        .with_context(|| format!("failed to enroll {username} in {classroom}"))?;
      Ok(())
    }
  }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "reflect.db")?
    .set_default("asset_dir", "photos")?
    .set_default("max_photo_bytes", 5 * 1024 * 1024)?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("REFLECT"))
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let asset_dir = expand_tilde(&server_cfg.asset_dir);
  let assets = DiskAssetStore::open(&asset_dir)
    .await
    .with_context(|| format!("failed to open photo directory {asset_dir:?}"))?;

  let state = AppState {
    journal: Journal::new(Arc::new(store), Arc::new(assets)),
    config:  Arc::new(server_cfg.clone()),
  };

  let app = reflect_http::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
