//! Payload decoding, parsing, ingestion and paced batch processing

pub mod batch;
pub mod decode;
pub mod ingestor;
pub mod parser;

pub use batch::{run_batch, BatchReport, UnitOutcome};
pub use decode::decode_payload;
pub use ingestor::{IngestOutcome, IngestPayload, Ingestor};
pub use parser::{parse_content, ParsedPrediction};
