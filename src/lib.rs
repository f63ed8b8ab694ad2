pub mod actors;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod cursor;
pub mod error;
pub mod paging;
pub mod pipeline;
pub mod sink;
pub mod types;

// 公開API
pub use api::{HttpSearchClient, SearchApi};
pub use config::{ConfigError, SearchConfig};
pub use cursor::PageCursor;
pub use error::SearchError;
pub use paging::{PagedSource, SourceFactory};
pub use pipeline::{PipelineEvents, QueryPipeline};
pub use sink::{Observables, ResultList, ResultSink};
pub use types::*;
