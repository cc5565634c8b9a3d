//! Playback with a synchronized transcript

use std::process::ExitCode;
use std::time::Duration;


use crate::application::ports::{ApiError, NotesApi};
use crate::application::{PlaybackController, TranscriptSyncView};
use crate::domain::playback::format_timestamp;
use crate::infrastructure::RodioEngineFactory;

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::input::{spawn_line_reader, Line};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

enum Wake {
    Pump,
    Key(Option<Line>),
    Interrupted,
}

/// A keyboard command during playback
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Toggle,
    Forward,
    Back,
    Segment(usize),
    List,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line {
        "" | "p" => Some(Command::Toggle),
        "f" => Some(Command::Forward),
        "b" => Some(Command::Back),
        "l" => Some(Command::List),
        "q" => Some(Command::Quit),
        n => n
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| Command::Segment(n - 1)),
    }
}

/// `voicenote play NOTE_ID`
pub async fn run_play(ctx: &AppContext, note_id: &str, audio: Option<String>) -> ExitCode {
    let presenter = Presenter::new();
    let api = ctx.api();

    let source = match audio {
        Some(source) => source,
        None => {
            let note = match api.note(note_id).await {
                Ok(note) => note,
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            match note.audio_url(&ctx.config.api_url_or_default()) {
                Some(url) => url,
                None => {
                    presenter.error("The service does not expose this note's audio");
                    presenter.info("Pass the audio explicitly with --audio <URL|FILE>");
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            }
        }
    };

    let segments = match api.transcript(note_id).await {
        Ok(transcript) => transcript.segments,
        Err(ApiError::NotFound(_)) => {
            presenter.warn("Transcript not available yet, playing audio only");
            Vec::new()
        }
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut playback = PlaybackController::new(RodioEngineFactory::new());
    if playback.load(&source).await.is_err() {
        return ExitCode::from(EXIT_ERROR);
    }
    if let Some(err) = playback.error() {
        presenter.error(&err.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let view = TranscriptSyncView::new(segments);
    let code = drive(ctx, &mut playback, view, &presenter).await;
    playback.dispose();
    code
}

async fn drive(
    ctx: &AppContext,
    playback: &mut PlaybackController<RodioEngineFactory>,
    mut view: TranscriptSyncView,
    presenter: &Presenter,
) -> ExitCode {
    let shutdown = ShutdownSignal::new();
    shutdown.setup();
    let mut lines = spawn_line_reader();
    let mut time = playback.subscribe();
    let skip = ctx.skip_seconds();

    presenter.transcript(view.segments(), &[]);
    presenter.info("[Enter/p] play/pause  [f/b] skip  [N] jump to line N  [l]ist  [q]uit");

    let mut ticker = tokio::time::interval(PUMP_INTERVAL);
    let mut announced_ready = false;

    loop {
        let wake = tokio::select! {
            _ = ticker.tick() => Wake::Pump,
            line = lines.recv() => Wake::Key(line),
            _ = shutdown.requested() => Wake::Interrupted,
        };

        match wake {
            Wake::Pump => {}
            Wake::Key(None) | Wake::Interrupted => break,
            Wake::Key(Some(line)) => match parse_command(&line) {
                Some(Command::Toggle) => {
                    let _ = playback.toggle_play();
                }
                Some(Command::Forward) => {
                    let _ = playback.skip(skip);
                }
                Some(Command::Back) => {
                    let _ = playback.skip(-skip);
                }
                Some(Command::Segment(index)) => {
                    if view.request_seek(index).is_none() {
                        presenter.warn(&format!("No line {}", index + 1));
                    }
                    view.forward_to(playback);
                }
                Some(Command::List) => presenter.transcript(view.segments(), view.active()),
                Some(Command::Quit) => break,
                None => presenter.warn(&format!("Unknown command '{}'", line)),
            },
        }

        playback.pump();
        if let Some(err) = playback.error() {
            presenter.error(&err.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        if !announced_ready && playback.is_ready() {
            announced_ready = true;
            presenter.info(&format!("Ready, {}", format_timestamp(playback.duration())));
        }
        if view.follow(&mut time) {
            for &index in view.active() {
                if let Some(segment) = view.segments().get(index) {
                    presenter.output(&presenter.format_segment(index, segment, true));
                }
            }
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
