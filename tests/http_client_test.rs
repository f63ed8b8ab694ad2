//! HTTPクライアントのテスト
//!
//! ローカルの使い捨てHTTP/1.1レスポンダーに対して実際のリクエストを送る

use anyhow::Result;
use pagesearch::{
    HttpSearchClient, PageRequest, Query, QueryPipeline, SearchApi, SearchConfig, SearchError,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

struct Canned {
    status: &'static str,
    headers: Vec<(&'static str, String)>,
    body: String,
}

/// Serve exactly one request with `canned` and hand back the raw request text.
async fn serve_once(canned: Canned) -> Result<(String, JoinHandle<String>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let handle = tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return String::new();
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let mut response = format!("HTTP/1.1 {}\r\n", canned.status);
        for (name, value) in &canned.headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str(&format!(
            "content-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            canned.body.len(),
            canned.body
        ));
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;

        String::from_utf8_lossy(&request).into_owned()
    });

    Ok((base_url, handle))
}

fn config_for(base_url: &str) -> SearchConfig {
    SearchConfig {
        base_url: base_url.to_string(),
        search_path: "search".to_string(),
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn test_success_with_pagination_header() -> Result<()> {
    let (base_url, server) = serve_once(Canned {
        status: "200 OK",
        headers: vec![
            (
                "link",
                "<http://x/search?q=octo&page=3>; rel=\"next\", <http://x/search?q=octo&page=7>; rel=\"last\""
                    .to_string(),
            ),
            ("x-ratelimit-remaining", "9".to_string()),
        ],
        body: r#"{"total_count": 250, "items": [{"id": 1, "name": "octocat", "stars": 3}]}"#
            .to_string(),
    })
    .await?;

    let client = HttpSearchClient::new(&config_for(&base_url))?;
    let result = client
        .search(&PageRequest::continuation(Query::from("octo"), 40, 2))
        .await?;

    assert_eq!(result.total_count, 250);
    assert_eq!(result.last_page, Some(7));
    assert_eq!(result.items[0].name, "octocat");
    assert_eq!(result.items[0].extra["stars"], 3);

    let request = server.await?.to_lowercase();
    assert!(request.starts_with("get /search?q=octo&per_page=40&page=2 "));
    assert!(request.contains("accept: application/vnd.github+json"));
    assert!(request.contains("user-agent: pagesearch/"));
    Ok(())
}

#[tokio::test]
async fn test_exhausted_rate_limit() -> Result<()> {
    let (base_url, server) = serve_once(Canned {
        status: "403 Forbidden",
        headers: vec![("x-ratelimit-remaining", "0".to_string())],
        body: r#"{"message": "API rate limit exceeded"}"#.to_string(),
    })
    .await?;

    let client = HttpSearchClient::new(&config_for(&base_url))?;
    let result = client
        .search(&PageRequest::initial(Query::from("octo"), 40))
        .await;

    assert_eq!(result, Err(SearchError::RateLimited));
    server.await?;
    Ok(())
}

#[tokio::test]
async fn test_success_without_link_is_no_results() -> Result<()> {
    let (base_url, server) = serve_once(Canned {
        status: "200 OK",
        headers: Vec::new(),
        body: r#"{"total_count": 0, "items": []}"#.to_string(),
    })
    .await?;

    let client = HttpSearchClient::new(&config_for(&base_url))?;
    let result = client
        .search(&PageRequest::initial(Query::from("zzzz"), 40))
        .await;

    assert_eq!(result, Err(SearchError::no_results("zzzz")));
    server.await?;
    Ok(())
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let client = HttpSearchClient::new(&config_for(&base_url))?;
    let result = client
        .search(&PageRequest::initial(Query::from("octo"), 40))
        .await;

    assert!(matches!(result, Err(SearchError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn test_silent_server_times_out() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    // Accept and never answer
    let server = tokio::spawn(async move {
        let accepted = listener.accept().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(accepted);
    });

    let mut config = config_for(&base_url);
    config.connect_timeout_secs = 1;
    config.read_timeout_secs = 1;
    let client = HttpSearchClient::new(&config)?;

    let result = timeout(
        Duration::from_secs(5),
        client.search(&PageRequest::initial(Query::from("octo"), 40)),
    )
    .await?;

    assert!(matches!(result, Err(SearchError::Transport(_))));
    server.abort();
    Ok(())
}

/// 入力からHTTP応答、結果リストの更新まで通して確認
#[tokio::test]
async fn test_pipeline_end_to_end() -> Result<()> {
    let (base_url, server) = serve_once(Canned {
        status: "200 OK",
        headers: vec![(
            "link",
            "<http://x/search?q=octo&page=2>; rel=\"last\"".to_string(),
        )],
        body: r#"{"total_count": 2, "items": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}"#
            .to_string(),
    })
    .await?;

    let mut config = config_for(&base_url);
    config.debounce_ms = 10;
    let (mut pipeline, _events) = QueryPipeline::with_http(config)?;
    let mut results = pipeline.observables().results();

    pipeline.submit_query("octo");
    timeout(Duration::from_secs(5), results.wait_for(|list| list.len() == 2)).await??;

    assert_eq!(pipeline.active_source().map(|s| s.next_key()), Some(Some(2)));
    assert!(server.await?.contains("q=octo"));
    pipeline.shutdown().await;
    Ok(())
}
