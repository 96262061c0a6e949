//! xliker CLI: capture liked or bookmarked posts and review the history.
//!
//! Usage:
//!   xliker capture <like|bookmark> --key <url> [--text ..] [--thread ..] [--link ..]
//!   xliker capture-html <like|bookmark> --file page.html --page-url <url>
//!   xliker fetch-article <key>
//!   xliker list | show <key> | export [keys..] | clear
//!   xliker config <show|init>

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xliker::export::export_keys;
use xliker::{
    ArticleFetcher, CaptureEvent, ChatSummarizer, FallbackFetcher, HistoryStore, HttpFetcher,
    Kind, OpenStore, Pipeline, PipelineError, Settings, SqliteStore,
    TimelineScraper,
};

#[derive(Parser)]
#[command(
    name = "xliker",
    version,
    about = "Capture, enrich and summarize liked or bookmarked posts"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a post from its fields
    Capture {
        /// like or bookmark
        kind: Kind,
        /// Permalink of the post
        #[arg(long)]
        key: String,
        /// Post text
        #[arg(long, default_value = "")]
        text: String,
        /// Long-form article body hosted on the social site
        #[arg(long, default_value = "")]
        long_form: String,
        /// Thread reply text (repeatable)
        #[arg(long = "thread")]
        threads: Vec<String>,
        /// External link (repeatable; the first one is fetched)
        #[arg(long = "link")]
        links: Vec<String>,
    },
    /// Capture the first post found in a saved page
    CaptureHtml {
        /// like or bookmark
        kind: Kind,
        /// Saved HTML file
        #[arg(long)]
        file: PathBuf,
        /// URL the page was saved from
        #[arg(long)]
        page_url: String,
    },
    /// Fetch the linked article of a finished record
    FetchArticle {
        key: String,
    },
    /// List captured records
    List,
    /// Show one record as JSON
    Show {
        key: String,
    },
    /// Print export text for the given records (all exportable when none)
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        keys: Vec<String>,
    },
    /// Remove every record
    Clear,
    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print effective settings
    Show,
    /// Write default settings if no file exists
    Init,
}

/// Get the default database path (~/.local/share/xliker/history.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("xliker").join("history.db")
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(db: Option<PathBuf>, settings: &Settings) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path)
        .map_err(|e| format!("Failed to open database: {}", e))?
        .with_max_items(settings.max_items);
    Ok(Arc::new(store))
}

fn build_pipeline(store: Arc<SqliteStore>, settings: &Settings) -> Result<Pipeline, String> {
    let http = Arc::new(
        HttpFetcher::new(settings.http_timeout())
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?,
    );
    let render = settings.render.to_fetcher().with_resolver(http.clone());
    let fetcher: Arc<dyn ArticleFetcher> = Arc::new(FallbackFetcher::new(http, Arc::new(render)));

    let summarizer = ChatSummarizer::new(settings.provider, settings.http_timeout())
        .map_err(|e| format!("Failed to build summarizer: {}", e))?
        .with_model(settings.model())
        .with_base_url(settings.base_url())
        .with_api_key(settings.api_key());

    Ok(Pipeline::new(store, fetcher, Arc::new(summarizer)).with_language(settings.language.clone()))
}

fn print_record(store: &dyn HistoryStore, key: &str) -> i32 {
    match store.get(key) {
        Ok(Some(record)) => {
            println!("{}  [{}]  {}", record.key, record.status, record.display_title());
            if let Some(error) = &record.error_message {
                println!("Error: {}", error);
            }
            let body = record
                .summary
                .as_deref()
                .or(record.raw_text.as_deref())
                .unwrap_or("(no outline yet)");
            println!("{}", body);
            0
        }
        Ok(None) => {
            println!("Record '{}' is no longer in history (max_items = {})", key, store.max_items());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_capture(pipeline: &Pipeline, event: CaptureEvent) -> i32 {
    let (record, size) = match pipeline.observe(&event) {
        Ok(observed) => observed,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("History: {}/{}", size, pipeline.store().max_items());

    match pipeline.process(&record).await {
        Ok(_) => print_record(pipeline.store().as_ref(), &record.key),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn read_page_event(kind: Kind, file: &Path, page_url: &str) -> Result<CaptureEvent, String> {
    let html = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))?;
    CaptureEvent::from_page(kind, &TimelineScraper::new(), &html, page_url).map_err(|e| match e {
        PipelineError::ScrapeUnavailable => {
            format!("no post with a permalink found in '{}'", file.display())
        }
        other => other.to_string(),
    })
}

async fn cmd_fetch_article(pipeline: &Pipeline, key: &str) -> i32 {
    match pipeline.fetch_article_for(key).await {
        Ok(_) => print_record(pipeline.store().as_ref(), key),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_list(store: &dyn HistoryStore) -> i32 {
    let records = match store.get_all() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if records.is_empty() {
        println!("No records yet.");
        return 0;
    }
    println!("{:<48}  {:<8}  {:<16}  {}", "KEY", "KIND", "STATUS", "TITLE");
    println!("{}", "-".repeat(100));
    for record in records {
        println!(
            "{:<48}  {:<8}  {:<16}  {}",
            record.key,
            record.kind.as_str(),
            record.status.as_str(),
            record.display_title()
        );
    }
    0
}

fn cmd_show(store: &dyn HistoryStore, key: &str) -> i32 {
    match store.get(key) {
        Ok(Some(record)) => match serde_json::to_string_pretty(&record) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Ok(None) => {
            eprintln!("Error: record '{}' not found", key);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(store: &dyn HistoryStore, keys: &[String], out: Option<&Path>) -> i32 {
    let records = match store.get_all() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let text = match export_keys(&records, keys) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match out {
        Some(path) => match std::fs::write(path, text) {
            Ok(()) => {
                println!("Wrote {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                1
            }
        },
        None => {
            println!("{}", text);
            0
        }
    }
}

fn cmd_clear(store: &dyn HistoryStore) -> i32 {
    match store.clear() {
        Ok(()) => {
            println!("History cleared.");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_config(action: ConfigAction, path: &Path, settings: &Settings) -> i32 {
    match action {
        ConfigAction::Show => match settings.redacted().to_yaml() {
            Ok(yaml) => {
                println!("# {}", path.display());
                print!("{}", yaml);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        ConfigAction::Init => {
            if path.exists() {
                eprintln!("Error: '{}' already exists", path.display());
                return 1;
            }
            match Settings::default().save(path) {
                Ok(()) => {
                    println!("Wrote {}", path.display());
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

fn open_pipeline(db: Option<PathBuf>, settings: &Settings) -> Result<Pipeline, String> {
    build_pipeline(open_store(db, settings)?, settings)
}

fn with_store(
    db: Option<PathBuf>,
    settings: &Settings,
    f: impl FnOnce(&dyn HistoryStore) -> i32,
) -> i32 {
    match open_store(db, settings) {
        Ok(store) => f(store.as_ref()),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn run(cli: Cli) -> i32 {
    let config_path = cli.config.unwrap_or_else(Settings::default_path);
    let settings = match Settings::load(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let db = cli.db;

    match cli.command {
        Commands::Config { action } => cmd_config(action, &config_path, &settings),
        Commands::List => with_store(db, &settings, cmd_list),
        Commands::Show { key } => with_store(db, &settings, |store| cmd_show(store, &key)),
        Commands::Export { out, keys } => {
            with_store(db, &settings, |store| cmd_export(store, &keys, out.as_deref()))
        }
        Commands::Clear => with_store(db, &settings, cmd_clear),
        Commands::Capture {
            kind,
            key,
            text,
            long_form,
            threads,
            links,
        } => {
            let event = CaptureEvent::new(kind, key)
                .with_primary_text(text)
                .with_long_form_text(long_form)
                .with_thread_texts(threads)
                .with_external_links(links);
            match open_pipeline(db, &settings) {
                Ok(pipeline) => cmd_capture(&pipeline, event).await,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::CaptureHtml {
            kind,
            file,
            page_url,
        } => {
            let event = match read_page_event(kind, &file, &page_url) {
                Ok(event) => event,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };
            match open_pipeline(db, &settings) {
                Ok(pipeline) => cmd_capture(&pipeline, event).await,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::FetchArticle { key } => match open_pipeline(db, &settings) {
            Ok(pipeline) => cmd_fetch_article(&pipeline, &key).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = run(cli).await;
    std::process::exit(code);
}
