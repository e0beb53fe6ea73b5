// Data models module
// Author: kelexine (https://github.com/kelexine)

pub mod request;
pub mod result;

pub use request::{AnalyzeOptions, AnalyzeRequest};
pub use result::{trace_id_of, PassthroughResult, ResultMap, StructuredResult, UpstreamResult};
