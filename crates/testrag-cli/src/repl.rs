//! Interactive command loop

use std::io::Write;
use testrag_rag::{AnswerMode, RagService};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Characters of each source shown after an answer
const SOURCE_PREVIEW_CHARS: usize = 80;

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Add(String),
    Query(String),
    List,
    Docs,
    Clear,
    Help,
    Exit,
    /// Known command missing its argument
    Usage(&'static str),
    Unknown(String),
    Empty,
}

/// What the loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Parse one input line
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_lowercase().as_str() {
        "add" if argument.is_empty() => ReplCommand::Usage("add <text>"),
        "add" => ReplCommand::Add(argument.to_string()),
        "query" | "q" if argument.is_empty() => ReplCommand::Usage("query <question>"),
        "query" | "q" => ReplCommand::Query(argument.to_string()),
        "list" => ReplCommand::List,
        "docs" => ReplCommand::Docs,
        "clear" => ReplCommand::Clear,
        "help" | "h" => ReplCommand::Help,
        "exit" | "quit" => ReplCommand::Exit,
        other => ReplCommand::Unknown(other.to_string()),
    }
}

pub fn print_help(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "\nAvailable Commands:")?;
    writeln!(out, "  add <text>        - Add a document to the knowledge base")?;
    writeln!(out, "  query <question>  - Ask a question (RAG-powered answer), alias: q")?;
    writeln!(out, "  list              - Show number of documents in knowledge base")?;
    writeln!(out, "  docs              - List the documents in the knowledge base")?;
    writeln!(out, "  clear             - Clear all documents from knowledge base")?;
    writeln!(out, "  help              - Show this help message")?;
    writeln!(out, "  exit              - Exit the application")?;
    Ok(())
}

/// Run one command against the service
pub async fn execute(
    rag: &RagService,
    command: ReplCommand,
    out: &mut impl Write,
) -> anyhow::Result<Flow> {
    match command {
        ReplCommand::Empty => {}
        ReplCommand::Add(text) => {
            rag.add_document(&text).await?;
            writeln!(out, "Document added successfully!")?;
        }
        ReplCommand::Query(question) => {
            writeln!(out, "\nSearching knowledge base and generating answer...\n")?;
            let response = rag.ask(&question).await?;
            writeln!(out, "Answer: {}", response.answer)?;

            if response.mode == AnswerMode::WithContext {
                writeln!(out, "\nSources:")?;
                for (i, source) in response.sources.iter().enumerate() {
                    writeln!(
                        out,
                        "  [{}] ({:.4}) {}",
                        i + 1,
                        source.score,
                        source.document.preview(SOURCE_PREVIEW_CHARS)
                    )?;
                }
            }
        }
        ReplCommand::List => {
            let count = rag.document_count().await;
            writeln!(out, "Total documents in knowledge base: {count}")?;
        }
        ReplCommand::Docs => {
            let documents = rag.all_documents().await;
            if documents.is_empty() {
                writeln!(out, "Knowledge base is empty.")?;
            }
            for document in documents {
                writeln!(out, "  {document}")?;
            }
        }
        ReplCommand::Clear => {
            rag.clear_documents().await;
            writeln!(out, "Knowledge base cleared!")?;
        }
        ReplCommand::Help => print_help(out)?,
        ReplCommand::Exit => {
            writeln!(out, "Goodbye!")?;
            return Ok(Flow::Exit);
        }
        ReplCommand::Usage(usage) => writeln!(out, "Usage: {usage}")?,
        ReplCommand::Unknown(_) => {
            writeln!(out, "Unknown command. Type 'help' for available commands.")?
        }
    }

    Ok(Flow::Continue)
}

/// Read commands from stdin until `exit` or end of input
pub async fn run(rag: &RagService) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    print_help(&mut stdout)?;

    loop {
        write!(stdout, "\nTestRAG> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(stdout)?;
            break;
        };

        match execute(rag, parse_command(&line), &mut stdout).await {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                tracing::debug!("Command failed: {e:?}");
                eprintln!("Error: {e}");
            }
        }
    }

    Ok(())
}
