//! Interactive chat loop.
//!
//! The conversation history lives here, in the front-end. Every question is
//! answered independently by the pipeline.

use anyhow::Result;
use local_rag::{Answer, RagPipeline};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::commands::{print_sources, truncate};

const HELP: &str = "\
Commands:
  /sources   show the sources of the last answer
  /history   list the questions asked so far
  /stats     show collection statistics
  /help      show this message
  /quit      leave the chat";

/// One question and the answer it received.
#[derive(Debug, Clone)]
pub struct Turn {
    pub question: String,
    pub answer: Answer,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Question(&'a str),
    Sources,
    History,
    Stats,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "/sources" => Input::Sources,
        "/history" => Input::History,
        "/stats" => Input::Stats,
        "/help" | "/?" => Input::Help,
        "/quit" | "/exit" | "quit" | "exit" => Input::Quit,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        question => Input::Question(question),
    }
}

pub async fn run(pipeline: &RagPipeline) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut history: Vec<Turn> = Vec::new();

    let stats = pipeline.store_stats().await;
    println!(
        "Chatting with '{}' ({} records). Type /help for commands, /quit to leave.",
        pipeline.config().collection_name,
        stats.record_count
    );

    loop {
        let line = match rl.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(cmd) => println!("Unknown command {cmd}. Type /help for commands."),
            Input::Stats => {
                let stats = pipeline.store_stats().await;
                let collection = &pipeline.config().collection_name;
                println!("{} records in '{collection}'", stats.record_count);
            }
            Input::History => {
                for (i, turn) in history.iter().enumerate() {
                    println!("{}. {} -> {}", i + 1, turn.question, truncate(&turn.answer.text, 60));
                }
            }
            Input::Sources => match history.last() {
                Some(turn) if !turn.answer.sources.is_empty() => {
                    print_sources(&turn.answer.sources);
                }
                _ => println!("No sources for the last answer."),
            },
            Input::Question(question) => {
                let _ = rl.add_history_entry(question);
                let answer = pipeline.ask(question).await;
                println!("rag> {}\n", answer.text);
                if let Some(e) = &answer.error {
                    eprintln!("warning: {e}");
                }
                history.push(Turn { question: question.to_string(), answer });
            }
        }
    }

    println!("Bye.");
    Ok(())
}
