//! Ask questions about a note

use std::process::ExitCode;

use crate::application::ports::{ApiError, NotesApi};
use crate::application::NoteChat;

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS};
use super::input::spawn_text_reader;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// What a typed line asks for
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Ask(&'a str),
    NewSession,
    Quit,
    Nothing,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Nothing,
        "/new" => Input::NewSession,
        "/quit" | "/q" => Input::Quit,
        question => Input::Ask(question),
    }
}

/// `voicenote chat NOTE_ID`
pub async fn run_chat(ctx: &AppContext, note_id: &str) -> ExitCode {
    let mut presenter = Presenter::new();
    let api = ctx.api();

    if let Err(e) = api.note(note_id).await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    shutdown.setup();
    let mut lines = spawn_text_reader();
    let mut chat = NoteChat::new(&api, note_id);

    presenter.info("Ask about this note. /new starts over, /quit or Ctrl+D leaves.");
    loop {
        presenter.prompt(">");
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = shutdown.requested() => None,
        };
        let Some(line) = line else {
            return ExitCode::from(EXIT_SUCCESS);
        };

        let question = match parse_input(&line) {
            Input::Nothing => continue,
            Input::Quit => return ExitCode::from(EXIT_SUCCESS),
            Input::NewSession => {
                chat.restart();
                presenter.info("Started a new conversation");
                continue;
            }
            Input::Ask(question) => question,
        };

        presenter.start_spinner("Thinking...");
        match chat.ask(question).await {
            Ok(reply) => {
                presenter.stop_spinner();
                if let Some(reply) = reply {
                    presenter.output(&reply);
                }
            }
            Err(e @ (ApiError::Unauthorized | ApiError::NotFound(_))) => {
                presenter.spinner_fail(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            Err(e) => presenter.spinner_fail(&e.to_string()),
        }
    }
}
