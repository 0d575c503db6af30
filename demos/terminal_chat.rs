use clap::Parser;
use policy_assistant::{
    APP_DESCRIPTION, APP_TITLE, INPUT_PLACEHOLDER, PolicyStore, handle_turn,
};
use policy_flow::{MessageRole, Transcript, Turn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

// Terminal front-end for the policy assistant.
// Every line typed is one turn; the transcript lives in this loop and is
// threaded through `handle_turn`, so nothing is shared between runs.
#[derive(Parser, Debug)]
#[command(name = "terminal_chat", about = "Chat with the policy assistant from a terminal")]
struct Args {
    /// YAML policy fixture to load instead of the built-in one
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    History,
    Skip,
    Ask(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        Command::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Command::Exit
    } else if line == "/history" {
        Command::History
    } else {
        Command::Ask(line)
    }
}

fn render(turn: &Turn) -> String {
    let speaker = match turn.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    format!("{speaker} > {}", turn.content)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let store = PolicyStore::load(args.fixture.as_deref())?;

    println!("{APP_TITLE}");
    println!("{APP_DESCRIPTION}");
    println!("Type 'exit' to leave, '/history' to replay the conversation.\n");

    let mut transcript = Transcript::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{INPUT_PLACEHOLDER}\n> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;

        match parse_command(&line) {
            Command::Exit => break,
            Command::Skip => continue,
            Command::History => {
                for turn in transcript.turns() {
                    println!("{}", render(turn));
                }
                println!();
            }
            Command::Ask(query) => {
                let outcome = handle_turn(&store, &transcript, query);
                debug!(matches = ?outcome.matched_ids, "turn handled");
                println!("\n{}\n", render(&Turn::assistant(outcome.response.as_str())));
                transcript = outcome.transcript;
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands() {
        assert_eq!(parse_command("  "), Command::Skip);
        assert_eq!(parse_command("EXIT"), Command::Exit);
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(
            parse_command(" premium for policy_1002 \n"),
            Command::Ask("premium for policy_1002")
        );
    }

    #[test]
    fn renders_speaker_prefix() {
        assert_eq!(render(&Turn::user("hi")), "you > hi");
        assert_eq!(render(&Turn::assistant("hello")), "assistant > hello");
    }
}
