//! postdesk command-line tool.
//!
//! # Responsibility
//! - Expose post management commands over any of the three backends.
//! - Print every result as JSON for scripting and smoke checks.
//!
//! Options fall back to `POSTDESK_*` environment variables, which may come
//! from a `.env` file in the working directory.
//!
//! ```bash
//! postdesk --database data/posts.db add --name "Launch notes" --category news
//! postdesk --mode statement list --search launch --sort Name
//! postdesk move-up 3
//! ```

use anyhow::Context;
use chrono::{FixedOffset, Local};
use clap::{Parser, Subcommand};
use log::debug;
use postdesk_core::{
    build_repository, default_log_level, export_posts_csv, init_logging, init_stderr_logging,
    LocalPostStorage, NewPost, PageRequest, PostId, PostService, PostStorage, RepositoryConfig,
    RepositoryMode, SortOrder,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "postdesk")]
#[command(about = "Manage ordered posts and their attachments", long_about = None)]
struct Cli {
    /// Repository backend: DirectStatement|LightweightMapping|FullMapping
    /// (or statement|mapped|orm)
    #[arg(long, env = "POSTDESK_REPOSITORY_MODE", default_value = "FullMapping")]
    mode: RepositoryMode,

    /// SQLite database file
    #[arg(long, env = "POSTDESK_DATABASE", default_value = "postdesk.db")]
    database: String,

    /// Attachment root directory
    #[arg(long, env = "POSTDESK_FILES", default_value = "files/posts")]
    files: PathBuf,

    /// Absolute directory for rotating log files; stderr when omitted
    #[arg(long, env = "POSTDESK_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level; logging stays off when neither this nor --log-dir is set
    #[arg(long, env = "POSTDESK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a post at the end of the manual order
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
        /// Attachment reference returned by `upload`
        #[arg(long)]
        file_name: Option<String>,
        /// Store the post as disabled
        #[arg(long)]
        inactive: bool,
    },
    /// List one page of posts
    List {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
        /// Substring matched against names
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Name|NameDesc|DisplayOrder
        #[arg(long, default_value = "DisplayOrder")]
        sort: String,
    },
    /// Show one post
    Show { id: PostId },
    /// Change name, category or enablement of a post
    Update {
        id: PostId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Soft-delete a post and remove its attachment
    Delete { id: PostId },
    /// Flip a post between enabled and disabled
    Toggle { id: PostId },
    /// Swap a post with its predecessor
    MoveUp { id: PostId },
    /// Swap a post with its successor
    MoveDown { id: PostId },
    /// Export live posts as CSV
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Render `Created` in UTC instead of local time
        #[arg(long)]
        utc: bool,
    },
    /// Store a file in the attachment root
    Upload {
        path: PathBuf,
        /// Stored name; defaults to the file's own name
        #[arg(long)]
        name: Option<String>,
    },
    /// Read a stored attachment
    Download {
        name: String,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    start_logging(&cli)?;

    let config = RepositoryConfig::new(cli.mode, cli.database.clone());
    let repo = build_repository(&config)
        .await
        .with_context(|| format!("failed to open `{}`", cli.database))?;
    let storage = Arc::new(LocalPostStorage::new(cli.files.clone()));
    let service = PostService::new(repo).with_storage(storage.clone());
    debug!(
        "event=cli_start module=cli status=ok backend={}",
        cli.mode.short_name()
    );

    run(cli.command, &service, storage.as_ref()).await
}

fn start_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    match (&cli.log_dir, &cli.log_level) {
        (Some(dir), _) => init_logging(level, dir)?,
        (None, Some(_)) => init_stderr_logging(level)?,
        (None, None) => {}
    }
    Ok(())
}

async fn run(
    command: Commands,
    service: &PostService,
    storage: &dyn PostStorage,
) -> anyhow::Result<()> {
    match command {
        Commands::Add {
            name,
            title,
            category,
            created_by,
            file_name,
            inactive,
        } => {
            let post = NewPost {
                active: Some(!inactive),
                created_by,
                name: Some(name),
                title,
                category,
                file_name,
            };
            emit(serde_json::to_value(service.create(&post).await?)?)
        }
        Commands::List {
            page,
            size,
            search,
            category,
            sort,
        } => {
            let request = PageRequest::new(page, size)
                .search(search)
                .category(category)
                .sort(SortOrder::from_key(&sort));
            let result = service.page(&request).await?;
            emit(json!({
                "items": result.items,
                "total_count": result.total_count,
                "page_count": result.page_count(size),
            }))
        }
        Commands::Show { id } => emit(serde_json::to_value(service.get(id).await?)?),
        Commands::Update {
            id,
            name,
            category,
            active,
        } => {
            let Some(mut post) = service.get(id).await? else {
                return emit(json!({ "id": id, "updated": false }));
            };
            if name.is_some() {
                post.name = name;
            }
            if category.is_some() {
                post.category = category;
            }
            if active.is_some() {
                post.active = active;
            }
            let updated = service.update(&post).await?;
            emit(json!({ "id": id, "updated": updated }))
        }
        Commands::Delete { id } => {
            let deleted = service.delete(id).await?;
            emit(json!({ "id": id, "deleted": deleted }))
        }
        Commands::Toggle { id } => {
            let active = service.toggle_active(id).await?;
            emit(json!({ "id": id, "found": active.is_some(), "active": active }))
        }
        Commands::MoveUp { id } => {
            let moved = service.move_up(id).await?;
            emit(json!({ "id": id, "moved": moved }))
        }
        Commands::MoveDown { id } => {
            let moved = service.move_down(id).await?;
            emit(json!({ "id": id, "moved": moved }))
        }
        Commands::Export { output, utc } => {
            let offset = if utc {
                FixedOffset::east_opt(0).context("zero offset is valid")?
            } else {
                *Local::now().offset()
            };
            let mut buffer = Vec::new();
            let rows = export_posts_csv(service.repository().as_ref(), &mut buffer, offset).await?;
            write_output(output.as_ref(), &buffer).await?;
            if output.is_some() {
                emit(json!({ "rows": rows }))?;
            }
            Ok(())
        }
        Commands::Upload { path, name } => {
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("`{}` has no file name", path.display()))?,
            };
            let mut file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            let reference = storage.upload(&mut file, &name).await?;
            emit(json!({ "reference": reference }))
        }
        Commands::Download { name, output } => {
            let bytes = storage.download(&name).await?;
            write_output(output.as_ref(), &bytes).await?;
            if output.is_some() {
                emit(json!({ "bytes": bytes.len() }))?;
            }
            Ok(())
        }
    }
}

fn emit(value: Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn write_output(output: Option<&PathBuf>, bytes: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write `{}`", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
