//! Client side of the assistant: consumes the relayed answer stream and
//! keeps the per-session state a front end renders.

pub mod api;
pub mod consumer;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod session;
pub mod speech;
pub mod transcript;

pub use api::QaClient;
pub use consumer::StreamConsumer;
pub use error::ClientError;
pub use session::{AskPhase, HistoryEntry, Session, Theme};
pub use speech::{SpeechInput, SpeechRecognizer};
pub use transcript::TranscriptExporter;
