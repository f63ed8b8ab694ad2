//! pagesearch - incremental search over a paginated HTTP search API
//!
//! Command-line usage:
//!   pagesearch [query]          - Search, then keep reading queries from stdin
//!   :more / :reset / :quit      - Commands accepted on stdin

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ出力は RUST_LOG で制御
    env_logger::init();

    pagesearch::cli::run_cli().await
}
