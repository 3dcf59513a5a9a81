use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_reader::command::{Command, CommandError, HELP};
use news_reader::config::Config;
use news_reader::render::{render_articles, render_sources, write_articles};
use news_reader::store::ArticleStore;
use news_reader::view::{ArticleListView, RouteParams, SOURCE_KEY_PARAM};

#[derive(Parser, Debug)]
#[command(about = "Browse, sort and filter articles from a news API")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "news.toml")]
    config: PathBuf,
    /// Source to open first (defaults to the configured default source)
    #[arg(long)]
    source: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the article list
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_reader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?.apply_env_overrides();
    info!("Using API at {}", config.base_url);

    let store = ArticleStore::from_config(&config)?;

    // The command loop plays the routing layer: `source <key>` updates the route
    let mut route = RouteParams::new();
    if let Some(source) = cli.source {
        route.insert(SOURCE_KEY_PARAM.to_string(), source);
    }
    let (route_tx, route_rx) = watch::channel(route);

    let view = ArticleListView::init(store.clone(), route_rx);

    let mut articles = view.articles();
    let printer = tokio::spawn(async move {
        while articles.changed().await.is_ok() {
            let list = articles.borrow_and_update().clone();
            if let Err(e) = write_articles(&mut std::io::stdout().lock(), &list) {
                warn!("Failed to print article list: {}", e);
            }
        }
    });

    let mut errors = store.errors();
    let error_printer = tokio::spawn(async move {
        while let Ok(err) = errors.recv().await {
            eprintln!("error: {}", err);
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            Command::Source(key) => {
                route_tx.send_modify(|params| match key {
                    Some(key) => {
                        params.insert(SOURCE_KEY_PARAM.to_string(), key);
                    }
                    None => {
                        params.remove(SOURCE_KEY_PARAM);
                    }
                });
            }
            Command::Sort { field, direction } => {
                if let Err(e) = store.set_sort(&field, direction) {
                    eprintln!("error: {}", e);
                }
            }
            // Bad patterns show up on the error stream
            Command::Filter(pattern) => {
                let _ = store.set_filter(&pattern);
            }
            Command::Sources => {
                let mut sources = store.sources();
                if store.fetch_sources().await.is_ok() {
                    let list = sources.borrow_and_update().clone();
                    if list.is_empty() {
                        println!("(no sources available)");
                    } else {
                        render_sources(&mut std::io::stdout().lock(), &list)?;
                    }
                }
            }
            Command::Show => {
                let list = view.articles().borrow().clone();
                render_articles(&mut std::io::stdout().lock(), &list)?;
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    drop(view);
    printer.abort();
    error_printer.abort();

    Ok(())
}
