use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use healthcare_qa::client::speech::CommandRecognizer;
use healthcare_qa::client::transcript::DEFAULT_FILE_NAME;
use healthcare_qa::client::{QaClient, Session, SpeechInput, TranscriptExporter};

#[derive(Parser)]
#[command(name = "healthqa")]
#[command(about = "Ask questions about a healthcare PDF, answered by a streaming LLM", long_about = None)]
struct Cli {
    /// Base URL of the healthcare-qa server
    #[arg(long, env = "HEALTHQA_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Directory transcripts are exported to
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Directory holding the TrueType family used for transcripts
    #[arg(long, default_value = "/usr/share/fonts/truetype/liberation")]
    font_dir: PathBuf,

    #[arg(long, default_value = "LiberationSans")]
    font_family: String,

    /// Speech-to-text command printing transcript candidates, best first
    #[arg(long, env = "HEALTHQA_SPEECH_COMMAND")]
    speech_command: Option<String>,
}

const HELP: &str = "\
Commands:
  upload <path>     upload a PDF and extract its text
  text              show the current document text
  edit <text>       replace the document text
  ask <question>    ask about the document (streams the answer)
  voice             dictate the question, then ask it
  history           show questions and answers so far
  toggle-history    show or hide history after each answer
  clear             clear the history
  export [file]     save the history as a PDF transcript
  theme             switch between light and dark output
  help              show this message
  quit              exit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = QaClient::new(&cli.server)?;
    let exporter = TranscriptExporter::new(&cli.font_dir, &cli.font_family);
    let mut speech = SpeechInput::probe([CommandRecognizer::detect(cli.speech_command.as_deref())]);
    let mut session = Session::new();

    println!("Healthcare document QA ({}). Type `help` for commands.", cli.server);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "upload" if !arg.is_empty() => {
                match client.upload_file(&mut session, &PathBuf::from(arg)).await {
                    Ok(()) => println!("Extracted {} characters.", session.document_text().len()),
                    Err(e) => eprintln!("{e}"),
                }
            }
            "text" => println!("{}", session.document_text()),
            "edit" => session.set_document_text(arg),
            "ask" => {
                if !arg.is_empty() {
                    session.set_question(arg);
                }
                ask(&client, &mut session).await;
            }
            "voice" => {
                if speech.start(&mut session).await.is_ok() {
                    println!("Question: {}", session.question());
                    ask(&client, &mut session).await;
                } else if let Some(error) = session.error() {
                    eprintln!("{error}");
                }
            }
            "history" => print_history(&session),
            "toggle-history" => {
                let shown = session.toggle_history_panel();
                println!("History {}.", if shown { "shown" } else { "hidden" });
            }
            "clear" => {
                session.clear_history();
                println!("History cleared.");
            }
            "export" => {
                let file = if arg.is_empty() { DEFAULT_FILE_NAME } else { arg };
                let path = cli.export_dir.join(file);
                match exporter.export(session.history(), &path) {
                    Ok(()) => println!("Saved {}", path.display()),
                    Err(e) => eprintln!("{e}"),
                }
            }
            "theme" => {
                let theme = session.toggle_theme();
                println!("Theme: {theme:?}");
            }
            "help" => println!("{HELP}"),
            "quit" | "exit" => break,
            _ => println!("{HELP}"),
        }
    }

    Ok(())
}

async fn ask(client: &QaClient, session: &mut Session) {
    let mut printed = 0;
    let result = client
        .ask(session, |answer| {
            // Updates carry the whole answer so far; print only what is new.
            if let Some(new) = answer.get(printed..) {
                print!("{new}");
                let _ = std::io::stdout().flush();
            }
            printed = answer.len();
        })
        .await;

    match result {
        Ok(_) => {
            println!();
            if session.show_history() {
                print_history(session);
            }
        }
        Err(e) => {
            if printed > 0 {
                println!();
            }
            eprintln!("{e}");
        }
    }
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        println!("No history yet.");
        return;
    }
    for (idx, entry) in session.history().iter().enumerate() {
        println!("Q{}: {}", idx + 1, entry.question);
        println!("A{}: {}\n", idx + 1, entry.answer);
    }
}
