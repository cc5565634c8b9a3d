//! Interactive microphone recording

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::application::{PlaybackController, RecordingController, TIMESLICE_MS};
use crate::domain::recording::RecorderStatus;
use crate::infrastructure::{CpalCaptureHost, RodioEngineFactory, TempFileUrlStore};

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS};
use super::args::UploadTarget;
use super::input::{spawn_line_reader, Line};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;
use super::upload_cmd::submit_and_watch;

type Recorder = RecordingController<CpalCaptureHost>;

enum Wake {
    Tick,
    Key(Option<Line>),
    Interrupted,
}

/// What the user chose after a take
enum Review {
    Upload,
    Redo,
    Quit,
}

/// `voicenote record`
pub async fn run_record(ctx: &AppContext, target: UploadTarget) -> ExitCode {
    let mut presenter = Presenter::new();
    let shutdown = ShutdownSignal::new();
    shutdown.setup();
    let mut lines = spawn_line_reader();

    let urls = match TempFileUrlStore::new() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let mut recorder = RecordingController::new(CpalCaptureHost::new(), urls);

    loop {
        if let Err(code) = capture(&mut recorder, &mut presenter, &mut lines, &shutdown).await {
            recorder.dispose();
            return code;
        }

        match review(&recorder, &presenter, &mut lines, &shutdown).await {
            Review::Upload => break,
            Review::Redo => {
                if recorder.reset().is_err() {
                    return ExitCode::from(EXIT_ERROR);
                }
            }
            Review::Quit => {
                recorder.dispose();
                presenter.info("Recording discarded");
                return ExitCode::from(EXIT_SUCCESS);
            }
        }
    }

    let source = recorder.confirm(Local::now().naive_local());
    recorder.dispose();
    match source {
        Some(source) => {
            submit_and_watch(ctx, source, &target, presenter, &mut lines, &shutdown).await
        }
        None => {
            presenter.error("No recording to upload");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Record until the user stops. Err carries the exit code when the take
/// was abandoned or could not start.
async fn capture(
    recorder: &mut Recorder,
    presenter: &mut Presenter,
    lines: &mut mpsc::UnboundedReceiver<Line>,
    shutdown: &ShutdownSignal,
) -> Result<(), ExitCode> {
    presenter.start_spinner("Opening microphone...");
    if recorder.start().await.is_err() {
        presenter.spinner_fail("Recorder is no longer usable");
        return Err(ExitCode::from(EXIT_ERROR));
    }
    if let Some(err) = recorder.error() {
        presenter.spinner_fail(&err.to_string());
        return Err(ExitCode::from(EXIT_ERROR));
    }
    presenter.update_recording(recorder.status(), recorder.elapsed_seconds());

    let mut ticker = tokio::time::interval(Duration::from_millis(TIMESLICE_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        let wake = tokio::select! {
            _ = ticker.tick() => Wake::Tick,
            line = lines.recv() => Wake::Key(line),
            _ = shutdown.requested() => Wake::Interrupted,
        };

        match wake {
            Wake::Tick => {
                let _ = recorder.tick();
            }
            Wake::Key(Some(key)) => match key.as_str() {
                "p" => {
                    let _ = recorder.pause();
                }
                "r" => {
                    let _ = recorder.resume();
                }
                "s" | "" => break,
                "q" => {
                    presenter.stop_spinner();
                    presenter.info("Recording discarded");
                    return Err(ExitCode::from(EXIT_SUCCESS));
                }
                other => tracing::debug!(key = other, "Unknown key"),
            },
            // stdin closed: finish the take
            Wake::Key(None) => break,
            Wake::Interrupted => {
                presenter.stop_spinner();
                presenter.warn("Recording cancelled");
                return Err(ExitCode::from(EXIT_ERROR));
            }
        }
        presenter.update_recording(recorder.status(), recorder.elapsed_seconds());
    }

    let elapsed = recorder.elapsed_seconds();
    let _ = recorder.stop();
    if let Some(err) = recorder.error() {
        presenter.spinner_fail(&err.to_string());
        return Err(ExitCode::from(EXIT_ERROR));
    }
    let summary = presenter.format_recording(RecorderStatus::Idle, elapsed);
    presenter.spinner_success(&summary);
    Ok(())
}

async fn review(
    recorder: &Recorder,
    presenter: &Presenter,
    lines: &mut mpsc::UnboundedReceiver<Line>,
    shutdown: &ShutdownSignal,
) -> Review {
    if let Some(blob) = recorder.result_blob() {
        presenter.info(&format!(
            "Recorded {} of {}",
            blob.human_readable_size(),
            blob.mime_type()
        ));
    }
    if let Some(url) = recorder.result_url() {
        presenter.info(&format!("Preview: {}", url));
    }

    loop {
        presenter.prompt("[u]pload [l]isten [x] redo [q]uit:");
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = shutdown.requested() => None,
        };
        match line.as_deref() {
            Some("u") | Some("") => return Review::Upload,
            Some("l") => {
                if let Some(url) = recorder.result_url() {
                    listen(url.as_str(), presenter, lines, shutdown).await;
                }
            }
            Some("x") => return Review::Redo,
            Some("q") | None => return Review::Quit,
            Some(_) => {}
        }
    }
}

/// Play the take once; any key stops it
async fn listen(
    url: &str,
    presenter: &Presenter,
    lines: &mut mpsc::UnboundedReceiver<Line>,
    shutdown: &ShutdownSignal,
) {
    let mut playback = PlaybackController::new(RodioEngineFactory::new());
    if playback.load(url).await.is_err() {
        return;
    }
    if let Some(err) = playback.error() {
        presenter.warn(&err.to_string());
        return;
    }

    presenter.info("Playing, press Enter to stop");
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut started = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = lines.recv() => break,
            _ = shutdown.requested() => break,
        }
        playback.pump();
        if !started && playback.is_ready() {
            started = playback.toggle_play().is_ok();
        } else if started && !playback.is_playing() {
            break;
        }
    }
    playback.dispose();
}
