//! In-memory state of one user session.
//!
//! Nothing here outlives the process. Mutations go through methods that
//! replace whole values, so a renderer can read the struct between any two
//! calls and see consistent state.

use serde::Serialize;

use super::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Lifecycle of one ask cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AskPhase {
    #[default]
    Idle,
    Streaming { question: String },
    Completed,
    Failed,
}

#[derive(Debug, Default)]
pub struct Session {
    document_text: String,
    question: String,
    streamed_answer: String,
    history: Vec<HistoryEntry>,
    phase: AskPhase,
    error: Option<String>,
    theme: Theme,
    show_history: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn streamed_answer(&self) -> &str {
        &self.streamed_answer
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn phase(&self) -> &AskPhase {
        &self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn show_history(&self) -> bool {
        self.show_history
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, AskPhase::Streaming { .. })
    }

    pub fn set_document_text(&mut self, text: impl Into<String>) {
        self.document_text = text.into();
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn toggle_history_panel(&mut self) -> bool {
        self.show_history = !self.show_history;
        self.show_history
    }

    pub fn clear_history(&mut self) {
        self.history = Vec::new();
    }

    /// A new upload discards the previous document before the request is made.
    pub fn begin_upload(&mut self) {
        self.error = None;
        self.document_text = String::new();
    }

    pub fn finish_upload(&mut self, result: Result<String, &ClientError>) {
        match result {
            Ok(text) => self.document_text = text,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Enter the streaming phase for the current question.
    ///
    /// Returns the question the answer will be filed under. A second call
    /// while streaming is rejected as busy; an empty document or question
    /// fails the cycle before any request is made.
    pub fn begin_ask(&mut self) -> Result<String, ClientError> {
        if self.is_loading() {
            return Err(ClientError::Busy);
        }

        self.error = None;
        self.streamed_answer = String::new();

        if self.document_text.trim().is_empty() || self.question.trim().is_empty() {
            let err = ClientError::MissingInput("Missing inputs");
            self.error = Some(err.to_string());
            self.phase = AskPhase::Failed;
            return Err(err);
        }

        let question = self.question.clone();
        self.phase = AskPhase::Streaming {
            question: question.clone(),
        };
        Ok(question)
    }

    pub fn publish_answer(&mut self, answer: &str) {
        self.streamed_answer = answer.to_string();
    }

    /// Stream closed: file the answer under the question it was asked for.
    pub fn complete_ask(&mut self, answer: String) -> HistoryEntry {
        let question = match std::mem::take(&mut self.phase) {
            AskPhase::Streaming { question } => question,
            _ => self.question.clone(),
        };

        let entry = HistoryEntry { question, answer };
        self.streamed_answer = entry.answer.clone();

        self.history.push(entry.clone());

        self.phase = AskPhase::Completed;
        entry
    }

    pub fn fail_ask(&mut self, error: &ClientError) {
        self.error = Some(error.to_string());
        self.phase = AskPhase::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> Session {
        let mut session = Session::new();
        session.set_document_text("Deductible: $500");
        session.set_question("What is the deductible?");
        session
    }

    #[test]
    fn test_ask_cycle_commits_history() {
        let mut session = ready_session();
        let question = session.begin_ask().unwrap();
        assert!(session.is_loading());

        session.publish_answer("The deductible");
        session.set_question("edited while streaming");
        session.publish_answer("The deductible is $500.");
        let entry = session.complete_ask("The deductible is $500.".to_string());

        assert_eq!(entry.question, question);
        assert_eq!(session.history(), &[entry]);
        assert_eq!(session.phase(), &AskPhase::Completed);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_concurrent_ask_is_rejected() {
        let mut session = ready_session();
        session.begin_ask().unwrap();
        assert!(matches!(session.begin_ask(), Err(ClientError::Busy)));
        assert!(session.is_loading());
    }

    #[test]
    fn test_missing_input_never_streams() {
        let mut session = Session::new();
        session.set_question("anything?");
        let err = session.begin_ask().unwrap_err();
        assert!(matches!(err, ClientError::MissingInput(_)));
        assert_eq!(session.phase(), &AskPhase::Failed);
        assert_eq!(session.error(), Some("Missing inputs"));
    }

    #[test]
    fn test_failed_cycle_leaves_history_alone() {
        let mut session = ready_session();
        session.begin_ask().unwrap();
        session.fail_ask(&ClientError::Rejected {
            status: 500,
            message: "Streaming failed".to_string(),
        });
        assert!(session.history().is_empty());
        assert_eq!(session.error(), Some("Streaming failed"));
        assert!(session.begin_ask().is_ok());
    }

    #[test]
    fn test_failed_upload_leaves_document_empty() {
        let mut session = ready_session();
        session.begin_upload();
        session.finish_upload(Err(&ClientError::Rejected {
            status: 500,
            message: "Failed to process PDF".to_string(),
        }));
        assert_eq!(session.document_text(), "");
        assert_eq!(session.error(), Some("Failed to process PDF"));
    }

    #[test]
    fn test_toggles_and_clear() {
        let mut session = ready_session();
        session.begin_ask().unwrap();
        session.complete_ask("a".to_string());
        session.clear_history();
        assert!(session.history().is_empty());

        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(session.toggle_theme(), Theme::Light);
        assert!(session.toggle_history_panel());
    }
}
