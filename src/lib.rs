pub mod config;
pub mod indexer;
pub mod model;
pub mod search;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use config::SearchConfig;
use model::types::{IndexEntry, IndexKeyword, IndexResult, QueryKeyword};
use search::hub::SearcherHub;
use search::query::SortOrder;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "keysearch",
    version,
    about = "Keyed, scored keyword index with paged search"
)]
pub struct Cli {
    /// Directory holding the indexes (defaults to KEYSEARCH_STORE_DIR, then the platform data dir)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert or replace an entry
    Put {
        /// Searcher (index) name
        name: String,
        key: String,
        #[arg(allow_negative_numbers = true)]
        score: i64,
        /// One or more keywords
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Delete an entry by key
    Remove { name: String, key: String },
    /// Print one page of matches
    Search {
        name: String,
        /// Keywords every match must carry
        keywords: Vec<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Desc)]
        sort: SortArg,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Results per page (defaults to KEYSEARCH_PAGE_SIZE, then 10)
        #[arg(long)]
        page_size: Option<usize>,
        /// Inclusive lower bound on keywords
        #[arg(long)]
        begin: Option<String>,
        /// Exclusive upper bound on keywords
        #[arg(long)]
        end: Option<String>,
        /// Only keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Emit JSON instead of tab-separated lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
    /// Relevance order
    None,
}

impl SortArg {
    fn options(self) -> u64 {
        SortOrder::to_options(match self {
            SortArg::Asc => Some(SortOrder::ScoreAscending),
            SortArg::Desc => Some(SortOrder::ScoreDescending),
            SortArg::None => None,
        })
    }
}

/// One page of search output, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub name: String,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: u64,
    pub hits: Vec<IndexResult>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    execute(cli, &mut std::io::stdout().lock())
}

/// Run a parsed command, writing its output to `out`.
pub fn execute(cli: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = SearchConfig::from_env();
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }

    match cli.command {
        Commands::Put {
            name,
            key,
            score,
            keywords,
        } => {
            let hub = SearcherHub::new(config);
            let keywords: Vec<IndexKeyword> =
                keywords.into_iter().map(IndexKeyword::from).collect();
            hub.open_searcher(&name)
                .with_context(|| format!("open searcher {name}"))?
                .update_entry(&IndexEntry::new(key.as_str(), score), &keywords)
                .with_context(|| format!("update entry {key}"))?;
            Ok(())
        }
        Commands::Remove { name, key } => {
            let hub = SearcherHub::new(config);
            hub.open_searcher(&name)
                .with_context(|| format!("open searcher {name}"))?
                .remove_entry(&key)
                .with_context(|| format!("remove entry {key}"))?;
            Ok(())
        }
        Commands::Search {
            name,
            keywords,
            sort,
            page,
            page_size,
            begin,
            end,
            prefix,
            json,
        } => {
            if let Some(size) = page_size {
                config.page_size = size;
            }
            let hub = SearcherHub::new(config);
            let searcher = hub
                .open_searcher(&name)
                .with_context(|| format!("open searcher {name}"))?;

            let mut terms: Vec<QueryKeyword> =
                prefix.into_iter().map(QueryKeyword::EntryPrefix).collect();
            terms.extend(keywords.into_iter().map(QueryKeyword::KeywordAll));
            let mut results = searcher
                .search(sort.options(), begin.as_deref(), end.as_deref(), &terms)
                .context("prepare search")?;

            let found = results.goto_page(page).context("fetch page")?;
            let page_out = SearchPage {
                name,
                page: if found { page } else { 0 },
                page_size: results.page_size(),
                page_count: results.page_count()?,
                total: results.total_count()?,
                hits: if found { results.collect() } else { Vec::new() },
            };
            print_page(&page_out, json, out)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "keysearch", out);
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            man.render(out)?;
            Ok(())
        }
    }
}

fn print_page(page: &SearchPage, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, page)?;
        writeln!(out)?;
        return Ok(());
    }
    for hit in &page.hits {
        writeln!(out, "{}\t{}", hit.key, hit.score)?;
    }
    writeln!(
        out,
        "# page {}/{} ({} total)",
        page.page, page.page_count, page.total
    )?;
    Ok(())
}

pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "keysearch", "keysearch")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("keysearch-data"))
}
