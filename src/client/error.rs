#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("A question is already being answered")]
    Busy,

    #[error("{0}")]
    MissingInput(&'static str),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Speech recognition not supported on this system.")]
    SpeechUnavailable,

    #[error("Speech recognition error: {0}")]
    Speech(String),

    #[error("Transcript export failed: {0:#}")]
    Export(anyhow::Error),
}
