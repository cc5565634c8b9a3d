//! Note view and project listing

use std::process::ExitCode;

use crate::application::ports::{ApiError, NotesApi};

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS};
use super::presenter::Presenter;

/// Print header, transcript and analysis. Missing transcript or analysis
/// means processing has not produced them yet.
pub async fn print_note<A: NotesApi>(
    api: &A,
    note_id: &str,
    presenter: &Presenter,
) -> Result<(), ApiError> {
    let note = api.note(note_id).await?;
    presenter.note_header(&note);

    match api.transcript(note_id).await {
        Ok(transcript) if !transcript.segments.is_empty() => {
            presenter.output("");
            presenter.transcript(&transcript.segments, &[]);
        }
        Ok(_) | Err(ApiError::NotFound(_)) => {
            presenter.info("Transcript not available yet");
        }
        Err(e) => return Err(e),
    }

    match api.analysis(note_id).await {
        Ok(analysis) if !analysis.is_empty() => {
            presenter.output("");
            presenter.analysis(&analysis);
        }
        Ok(_) | Err(ApiError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

/// `voicenote show NOTE_ID`
pub async fn run_show(ctx: &AppContext, note_id: &str) -> ExitCode {
    let presenter = Presenter::new();
    match print_note(&ctx.api(), note_id, &presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// `voicenote projects`
pub async fn run_projects(ctx: &AppContext) -> ExitCode {
    let presenter = Presenter::new();
    match ctx.api().projects().await {
        Ok(projects) if projects.is_empty() => {
            presenter.info("No projects yet");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(projects) => {
            let default = ctx.config.default_project.as_deref();
            for project in &projects {
                presenter.project(project);
            }
            if let Some(default) = default {
                if !projects.iter().any(|p| p.id == default) {
                    presenter.warn(&format!("default_project '{}' is not in this list", default));
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
