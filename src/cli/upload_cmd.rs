//! Upload and watch runners

use std::path::Path;
use std::process::ExitCode;

use tokio::sync::mpsc;

use crate::application::ports::{ApiError, NotesApi};
use crate::application::{StatusEvent, StatusWatch, UploadError, UploadEvent, UploadOrchestrator};
use crate::domain::status::ChannelState;
use crate::domain::upload::{check_extension, UploadPhase, UploadSource};
use crate::infrastructure::{HttpNotesApi, NotifyRustNotifier};

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::args::UploadTarget;
use super::input::{spawn_line_reader, Line};
use super::navigator::TerminalNavigator;
use super::note_cmd::print_note;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

type Orchestrator = UploadOrchestrator<HttpNotesApi, NotifyRustNotifier, TerminalNavigator>;

/// `voicenote upload FILE`
pub async fn run_upload(ctx: &AppContext, file: &Path, target: UploadTarget) -> ExitCode {
    let presenter = Presenter::new();

    if let Err(e) = check_extension(file) {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }
    let data = match tokio::fs::read(file).await {
        Ok(data) => data,
        Err(e) => {
            presenter.error(&format!("Cannot read {}: {}", file.display(), e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let source = match UploadSource::file(file, data) {
        Ok(source) => source,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    shutdown.setup();
    let mut lines = spawn_line_reader();
    submit_and_watch(ctx, source, &target, presenter, &mut lines, &shutdown).await
}

/// Destination project: flag, then config, then the first listed project
async fn resolve_project(
    ctx: &AppContext,
    target: &UploadTarget,
    presenter: &Presenter,
) -> Result<String, ApiError> {
    if let Some(project) = target
        .project
        .clone()
        .or_else(|| ctx.config.default_project.clone())
        .filter(|p| !p.trim().is_empty())
    {
        return Ok(project);
    }

    let projects = ctx.api().projects().await?;
    match projects.first() {
        Some(project) => {
            presenter.info(&format!(
                "Uploading to project '{}' ({})",
                project.name, project.id
            ));
            Ok(project.id.clone())
        }
        None => Err(ApiError::NotFound("project".to_string())),
    }
}

/// Submit `source`, then follow processing until it ends
pub async fn submit_and_watch(
    ctx: &AppContext,
    source: UploadSource,
    target: &UploadTarget,
    mut presenter: Presenter,
    lines: &mut mpsc::UnboundedReceiver<Line>,
    shutdown: &ShutdownSignal,
) -> ExitCode {
    let config = match ctx.upload_config(target.notify) {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&format!("Invalid watch_timeout: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let project = match resolve_project(ctx, target, &presenter).await {
        Ok(project) => project,
        Err(ApiError::NotFound(_)) => {
            presenter.error("No project to upload to. Pass -p <id> or set default_project.");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let navigator = TerminalNavigator::new();
    let mut orchestrator = UploadOrchestrator::new(
        ctx.api(),
        ctx.transport(),
        NotifyRustNotifier::new(),
        navigator.clone(),
        config,
    );
    let file_name = source.file_name();
    orchestrator.set_source(source);
    orchestrator.set_project(&project);
    if let Some(title) = target.title.as_deref() {
        orchestrator.set_title(title);
    }

    loop {
        presenter.start_spinner(&format!("Uploading {}...", file_name));
        if orchestrator.submit().await == UploadPhase::Watching {
            presenter.spinner_success(&format!(
                "Uploaded '{}'",
                orchestrator.draft().title().trim()
            ));
            break;
        }

        let Some(err) = orchestrator.error().cloned() else {
            presenter.spinner_fail("Upload did not start");
            return ExitCode::from(EXIT_ERROR);
        };
        presenter.spinner_fail(&err.to_string());
        match err {
            UploadError::Draft(_) => return ExitCode::from(EXIT_USAGE_ERROR),
            err if err.is_retryable() => {
                presenter.prompt("Retry upload? [y/N]");
                if !confirmed(lines, shutdown).await {
                    return ExitCode::from(EXIT_ERROR);
                }
            }
            _ => return ExitCode::from(EXIT_ERROR),
        }
    }

    let code = follow_upload(&mut orchestrator, &mut presenter, lines, shutdown).await;
    orchestrator.shutdown().await;

    if let Some(note_id) = navigator.take() {
        presenter.output("");
        if let Err(e) = print_note(&ctx.api(), &note_id, &presenter).await {
            presenter.warn(&format!("Could not load the note: {}", e));
        }
    }
    code
}

async fn confirmed(lines: &mut mpsc::UnboundedReceiver<Line>, shutdown: &ShutdownSignal) -> bool {
    tokio::select! {
        line = lines.recv() => matches!(line.as_deref(), Some("y") | Some("yes")),
        _ = shutdown.requested() => false,
    }
}

async fn follow_upload(
    orchestrator: &mut Orchestrator,
    presenter: &mut Presenter,
    lines: &mut mpsc::UnboundedReceiver<Line>,
    shutdown: &ShutdownSignal,
) -> ExitCode {
    let note_id = orchestrator.note_id().unwrap_or_default().to_string();
    presenter.start_progress("Waiting");

    loop {
        let event = tokio::select! {
            event = orchestrator.next_event() => Some(event),
            _ = shutdown.requested() => None,
        };

        match event {
            None => {
                presenter.progress_fail("Stopped watching; processing continues on the server");
                presenter.info(&format!("Resume with: voicenote watch {}", note_id));
                return ExitCode::from(EXIT_ERROR);
            }
            Some(Some(UploadEvent::Channel(ChannelState::Connecting))) => {
                presenter.progress_message("Connecting...");
            }
            Some(Some(UploadEvent::Channel(ChannelState::Closed))) => {
                let reason = orchestrator
                    .error()
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "Status connection closed".to_string());
                presenter.progress_fail(&reason);
                presenter.prompt("Reconnect? [y/N]");
                if !confirmed(lines, shutdown).await || !orchestrator.rewatch().await {
                    presenter.info(&format!("Resume with: voicenote watch {}", note_id));
                    return ExitCode::from(EXIT_ERROR);
                }
                presenter.start_progress("Waiting");
            }
            Some(Some(UploadEvent::Channel(_))) => {}
            Some(Some(UploadEvent::Progress(snapshot))) => presenter.update_progress(&snapshot),
            Some(Some(UploadEvent::Completed { .. })) => {
                presenter.progress_success("Processing completed");
                return ExitCode::from(EXIT_SUCCESS);
            }
            Some(Some(UploadEvent::Failed(err))) => {
                presenter.progress_fail(&err.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            Some(None) => {
                presenter.progress_fail("Status channel unavailable");
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }
}

/// `voicenote watch NOTE_ID`
pub async fn run_watch(ctx: &AppContext, note_id: &str) -> ExitCode {
    let mut presenter = Presenter::new();
    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let mut watch = StatusWatch::spawn(ctx.transport(), Some(note_id), true);
    presenter.start_progress("Waiting");

    let code = loop {
        let event = tokio::select! {
            event = watch.next() => event,
            _ = shutdown.requested() => {
                presenter.progress_fail("Stopped watching");
                break ExitCode::from(EXIT_ERROR);
            }
        };

        match event {
            Some(StatusEvent::StateChanged(ChannelState::Connecting)) => {
                presenter.progress_message("Connecting...");
            }
            Some(StatusEvent::StateChanged(ChannelState::Closed)) | None => {
                presenter.progress_fail("Status connection closed");
                break ExitCode::from(EXIT_ERROR);
            }
            Some(StatusEvent::StateChanged(_)) => {}
            Some(StatusEvent::Snapshot(snapshot)) => {
                presenter.update_progress(&snapshot);
                if snapshot.status.is_failed() {
                    presenter.progress_fail("Processing failed on the server");
                    break ExitCode::from(EXIT_ERROR);
                }
            }
            Some(StatusEvent::Completed(_)) => {
                presenter.progress_success("Processing completed");
                break ExitCode::from(EXIT_SUCCESS);
            }
        }
    };

    watch.close().await;
    code
}
