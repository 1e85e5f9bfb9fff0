//! Progress stream: event types and the subprocess output parser.

mod parser;
mod types;

pub use parser::{LineBuffer, OutputClassifier};
pub use types::{ProgressEvent, Stage};
