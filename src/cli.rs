//! Line-oriented front end
//!
//! Every line read from stdin is the current content of the search box.
//! Lines starting with `:` are commands.

use crate::actors::PipelineMessage;
use crate::config::SearchConfig;
use crate::core::Message;
use crate::pipeline::QueryPipeline;
use crate::types::Item;
use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const COMMAND_PREFIX: char = ':';
pub const COMMAND_MORE: &str = "more";
pub const COMMAND_RESET: &str = "reset";
pub const COMMAND_QUIT: &str = "quit";

/// pagesearch - incremental search over a paginated HTTP search API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Query to search right away
    pub query: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend root URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Search path below the base URL
    #[arg(long)]
    pub search_path: Option<String>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Quiet period before a typed query is sent
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Concurrent remote requests
    #[arg(long)]
    pub workers: Option<usize>,
}

impl Cli {
    /// Resolve the configuration: file, then flags, then environment.
    pub fn load_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SearchConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(search_path) = &self.search_path {
            config.search_path = search_path.clone();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
            config.initial_load_size = page_size;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }

        let config = config.with_env_token();
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Query(String),
    More,
    Reset,
    Quit,
    Unknown(String),
}

/// 入力行をクエリまたはコマンドとして解釈
pub fn parse_line(line: &str) -> InputLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix(COMMAND_PREFIX) else {
        return InputLine::Query(line.to_string());
    };
    match command.trim() {
        COMMAND_MORE => InputLine::More,
        COMMAND_RESET => InputLine::Reset,
        COMMAND_QUIT => InputLine::Quit,
        other => InputLine::Unknown(other.to_string()),
    }
}

/// CLI実行エントリーポイント
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    debug!("Search endpoint: {}", config.endpoint());

    let debounce = config.debounce();
    let (mut pipeline, mut events) =
        QueryPipeline::with_http(config).context("failed to create search client")?;
    let mut loading = pipeline.observables().loading();

    if let Some(query) = &cli.query {
        pipeline.submit_query(query.as_str());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => match parse_line(&line) {
                        InputLine::Query(text) => pipeline.submit_query(text),
                        InputLine::More => {
                            if !pipeline.load_more() {
                                eprintln!("no more pages");
                            }
                        }
                        InputLine::Reset => pipeline.reset_query(),
                        InputLine::Quit => break,
                        InputLine::Unknown(command) => eprintln!("unknown command :{}", command),
                    },
                    // 入力終了後は実行中の検索が落ち着くまで待つ
                    None => input_open = false,
                }
            }
            Some(event) = events.recv() => render(event),
            _ = async {
                tokio::time::sleep(debounce).await;
                let _ = loading.wait_for(|busy| !*busy).await;
            }, if !input_open => break,
        }
    }

    while let Ok(event) = events.try_recv() {
        render(event);
    }
    pipeline.shutdown().await;
    Ok(())
}

fn render(event: Message<PipelineMessage>) {
    if let PipelineMessage::SearchFailed { error, .. } = &event.payload {
        eprintln!("{}", error);
        return;
    }
    for line in result_lines(&event.payload) {
        println!("{}", line);
    }
}

/// 通知に含まれる結果だけを整形する（表示時点のリストは参照しない）
fn result_lines(payload: &PipelineMessage) -> Vec<String> {
    match payload {
        PipelineMessage::ResultsReset {
            query,
            items,
            next_key,
        } => {
            let header = format!(
                "== {} ({} items{})",
                query,
                items.len(),
                more_hint(*next_key)
            );
            std::iter::once(header).chain(numbered(0, items)).collect()
        }
        PipelineMessage::ResultsAppended {
            page,
            offset,
            items,
            next_key,
        } => {
            let header = format!(
                "-- page {} ({} items{})",
                page,
                items.len(),
                more_hint(*next_key)
            );
            std::iter::once(header)
                .chain(numbered(*offset, items))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn numbered(offset: usize, items: &[Item]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .enumerate()
        .map(move |(index, item)| format!("{:>5}  {}", offset + index + 1, item.name))
}

fn more_hint(next_key: Option<u32>) -> &'static str {
    if next_key.is_some() {
        ", :more for next page"
    } else {
        ""
    }
}
