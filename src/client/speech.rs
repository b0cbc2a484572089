//! Voice input for the question field.
//!
//! Which recognizer exists depends on the machine, so the capability is
//! probed once at startup and carried as [`SpeechInput`]. Callers only ever
//! care whether one is present.

use std::process::Command;

use tokio::sync::mpsc;

use super::error::ClientError;
use super::session::Session;

/// Shown in the question field while the recognizer is listening.
pub const LISTENING_PLACEHOLDER: &str = "Listening...";

#[derive(Debug, Clone)]
pub struct RecognitionOptions {
    pub lang: String,
    pub interim_results: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            interim_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Started,
    /// Transcript candidates, best first.
    Result(Vec<String>),
    Error(String),
}

pub trait SpeechRecognizer: Send {
    fn name(&self) -> &str;

    /// Listen for one utterance, reporting progress through `emit`.
    fn recognize(&mut self, options: &RecognitionOptions, emit: &mut dyn FnMut(SpeechEvent));
}

pub enum SpeechInput {
    Available(Box<dyn SpeechRecognizer>),
    Unavailable,
}

impl SpeechInput {
    /// Take the first recognizer that is present.
    pub fn probe<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Option<Box<dyn SpeechRecognizer>>>,
    {
        match candidates.into_iter().flatten().next() {
            Some(recognizer) => {
                tracing::info!("Speech recognition available via {}", recognizer.name());
                SpeechInput::Available(recognizer)
            }
            None => {
                tracing::info!("No speech recognizer available");
                SpeechInput::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SpeechInput::Available(_))
    }

    /// Capture one utterance into the session's question field.
    ///
    /// The first candidate of a result replaces the question verbatim; an
    /// error is surfaced through the session. Single shot, no retry. The
    /// recognizer blocks while listening, so it runs on the blocking pool and
    /// its events are applied here as they arrive.
    pub async fn start(&mut self, session: &mut Session) -> Result<(), ClientError> {
        let mut recognizer = match std::mem::replace(self, SpeechInput::Unavailable) {
            SpeechInput::Available(recognizer) => recognizer,
            SpeechInput::Unavailable => {
                let err = ClientError::SpeechUnavailable;
                session.set_error(err.to_string());
                return Err(err);
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::task::spawn_blocking(move || {
            recognizer.recognize(&RecognitionOptions::default(), &mut |event: SpeechEvent| {
                let _ = tx.send(event);
            });
            recognizer
        });

        let mut outcome = Ok(());
        while let Some(event) = rx.recv().await {
            match event {
                SpeechEvent::Started => session.set_question(LISTENING_PLACEHOLDER),
                SpeechEvent::Result(candidates) => {
                    if let Some(transcript) = candidates.into_iter().next() {
                        session.set_question(transcript);
                    }
                }
                SpeechEvent::Error(reason) => {
                    let err = ClientError::Speech(reason);
                    session.set_error(err.to_string());
                    outcome = Err(err);
                }
            }
        }

        match task.await {
            Ok(recognizer) => *self = SpeechInput::Available(recognizer),
            Err(e) => {
                tracing::error!("Speech recognizer task failed: {e}");
                let err = ClientError::Speech(e.to_string());
                session.set_error(err.to_string());
                outcome = Err(err);
            }
        }

        outcome
    }
}

/// Recognizer backed by an external speech-to-text command.
///
/// The command records one utterance and prints its transcript candidates,
/// one per line, best first. `{lang}` in the arguments is replaced with the
/// requested language.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Present only when a command line was configured.
    pub fn detect(command_line: Option<&str>) -> Option<Box<dyn SpeechRecognizer>> {
        let mut parts = command_line?.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Box::new(Self {
            program,
            args: parts.collect(),
        }))
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn recognize(&mut self, options: &RecognitionOptions, emit: &mut dyn FnMut(SpeechEvent)) {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{lang}", &options.lang))
            .collect();

        emit(SpeechEvent::Started);

        let output = match Command::new(&self.program).args(&args).output() {
            Ok(output) => output,
            Err(e) => {
                emit(SpeechEvent::Error(format!("{}: {e}", self.program)));
                return;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            emit(SpeechEvent::Error(reason));
            return;
        }

        let candidates: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if candidates.is_empty() {
            emit(SpeechEvent::Error("no-speech".to_string()));
        } else {
            emit(SpeechEvent::Result(candidates));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<SpeechEvent>);

    impl SpeechRecognizer for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(&mut self, _options: &RecognitionOptions, emit: &mut dyn FnMut(SpeechEvent)) {
            for event in self.0.drain(..) {
                emit(event);
            }
        }
    }

    fn scripted(events: Vec<SpeechEvent>) -> Option<Box<dyn SpeechRecognizer>> {
        Some(Box::new(Scripted(events)))
    }

    #[test]
    fn test_probe_picks_first_present() {
        assert!(!SpeechInput::probe(vec![None, None]).is_available());
        assert!(SpeechInput::probe(vec![None, scripted(vec![])]).is_available());
    }

    #[tokio::test]
    async fn test_unavailable_surfaces_error() {
        let mut session = Session::new();
        let mut input = SpeechInput::Unavailable;
        assert!(matches!(
            input.start(&mut session).await,
            Err(ClientError::SpeechUnavailable)
        ));
        assert_eq!(
            session.error(),
            Some("Speech recognition not supported on this system.")
        );
    }

    #[tokio::test]
    async fn test_first_candidate_replaces_question() {
        let mut session = Session::new();
        session.set_question("old question");
        let mut input = SpeechInput::probe([scripted(vec![
            SpeechEvent::Started,
            SpeechEvent::Result(vec![
                "what is my copay".to_string(),
                "what is my co-pay".to_string(),
            ]),
        ])]);

        input.start(&mut session).await.unwrap();
        assert_eq!(session.question(), "what is my copay");
        assert_eq!(session.error(), None);
        assert!(input.is_available(), "recognizer is kept for the next use");
    }

    #[tokio::test]
    async fn test_recognizer_error() {
        let mut session = Session::new();
        let mut input = SpeechInput::probe([scripted(vec![
            SpeechEvent::Started,
            SpeechEvent::Error("not-allowed".to_string()),
        ])]);

        assert!(input.start(&mut session).await.is_err());
        assert_eq!(session.question(), LISTENING_PLACEHOLDER);
        assert_eq!(
            session.error(),
            Some("Speech recognition error: not-allowed")
        );
    }

    #[test]
    fn test_command_recognizer_detection() {
        assert!(CommandRecognizer::detect(None).is_none());
        assert!(CommandRecognizer::detect(Some("   ")).is_none());
        let recognizer = CommandRecognizer::detect(Some("whisper-listen --lang {lang}")).unwrap();
        assert_eq!(recognizer.name(), "whisper-listen");
    }
}
