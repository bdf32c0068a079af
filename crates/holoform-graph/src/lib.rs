pub mod cache;
pub mod call_graph;
pub mod project;
pub mod query;

pub use cache::{content_hash, FileHashCache, RecordStore};
pub use call_graph::CallGraph;
pub use project::{module_id, relative_path, ParseStats, ProjectIndex, ProjectParser};
pub use query::{Query, QueryEngine};
