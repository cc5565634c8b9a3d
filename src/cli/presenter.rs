//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::note::{Note, Project};
use crate::domain::playback::format_timestamp;
use crate::domain::recording::{format_elapsed, RecorderStatus};
use crate::domain::status::StatusSnapshot;
use crate::domain::transcript::{Analysis, TranscriptSegment};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    progress: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            spinner: None,
            progress: None,
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Show the processing bar; percent runs 0..=100
    pub fn start_progress(&mut self, message: &str) {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:24.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        self.progress = Some(bar);
    }

    pub fn update_progress(&self, snapshot: &StatusSnapshot) {
        if let Some(ref bar) = self.progress {
            bar.set_position(snapshot.display_progress().round() as u64);
            bar.set_message(snapshot.status.label().to_string());
        }
    }

    /// Set the bar message without moving it
    pub fn progress_message(&self, message: &str) {
        if let Some(ref bar) = self.progress {
            bar.set_message(message.to_string());
        }
    }

    pub fn progress_success(&mut self, message: &str) {
        if let Some(bar) = self.progress.take() {
            bar.set_position(100);
            bar.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    pub fn progress_fail(&mut self, message: &str) {
        if let Some(bar) = self.progress.take() {
            bar.abandon_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    pub fn stop_progress(&mut self) {
        if let Some(bar) = self.progress.take() {
            bar.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Prompt on stderr without a newline
    pub fn prompt(&self, text: &str) {
        eprint!("{} ", text.bold());
        let _ = io::stderr().flush();
    }

    /// One-line recorder state, e.g. `● REC 01:05`
    pub fn format_recording(&self, status: RecorderStatus, elapsed_seconds: u64) -> String {
        let clock = format_elapsed(elapsed_seconds);
        match status {
            RecorderStatus::Recording => format!("{} REC {}", "●".red(), clock),
            RecorderStatus::Paused => format!("{} PAUSED {}", "❚❚".yellow(), clock),
            RecorderStatus::Idle => format!("{} {}", "■".cyan(), clock),
        }
    }

    pub fn update_recording(&self, status: RecorderStatus, elapsed_seconds: u64) {
        let line = self.format_recording(status, elapsed_seconds);
        self.update_spinner(&format!("{line}  {}", "[p]ause [r]esume [s]top [q]uit".dimmed()));
    }

    /// Format one transcript line; the active one is highlighted
    pub fn format_segment(&self, index: usize, segment: &TranscriptSegment, active: bool) -> String {
        let stamp = format!(
            "{:>3}. [{}-{}]",
            index + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        );
        let speaker = format!("{}:", segment.speaker_label());
        if active {
            format!(
                "{} {} {} {}",
                "▶".green(),
                stamp.green().bold(),
                speaker.green().bold(),
                segment.text.bold()
            )
        } else {
            format!("  {} {} {}", stamp.dimmed(), speaker.cyan(), segment.text)
        }
    }

    pub fn transcript(&self, segments: &[TranscriptSegment], active: &[usize]) {
        for (i, segment) in segments.iter().enumerate() {
            self.output(&self.format_segment(i, segment, active.contains(&i)));
        }
    }

    pub fn analysis(&self, analysis: &Analysis) {
        if let Some(summary) = analysis.summary.as_deref().filter(|s| !s.is_empty()) {
            self.output(&format!("{}", "Summary".bold()));
            self.output(&format!("  {}", summary));
        }
        if !analysis.topics().is_empty() {
            self.key_value("Topics", &analysis.topics().join(", "));
        }
        if !analysis.keywords().is_empty() {
            self.key_value("Keywords", &analysis.keywords().join(", "));
        }
        if !analysis.action_items().is_empty() {
            self.output(&format!("{}", "Action items".bold()));
            for item in analysis.action_items() {
                let mut line = format!("  • {}", item.text());
                if let Some(assignee) = item.assignee() {
                    line.push_str(&format!(" {}", format!("@{assignee}").cyan()));
                }
                if let Some(deadline) = item.deadline() {
                    line.push_str(&format!(" {}", format!("(due {deadline})").yellow()));
                }
                self.output(&line);
            }
        }
    }

    pub fn note_header(&self, note: &Note) {
        self.output(&format!("{}", note.display_title().bold()));
        let mut details = vec![format!("id {}", note.id), note.status.label().to_string()];
        if let Some(duration) = note.duration_seconds {
            details.push(format_timestamp(duration));
        }
        if let Some(language) = note.language.as_deref() {
            details.push(language.to_string());
        }
        self.output(&format!("{}", details.join(" · ").dimmed()));
    }

    pub fn project(&self, project: &Project) {
        match project.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => self.output(&format!(
                "{}  {}  {}",
                project.id.dimmed(),
                project.name.bold(),
                description
            )),
            None => self.output(&format!("{}  {}", project.id.dimmed(), project.name.bold())),
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> TranscriptSegment {
        TranscriptSegment {
            speaker: "SPEAKER_01".to_string(),
            start: 65.0,
            end: 70.5,
            text: "Ship it".to_string(),
            confidence: None,
        }
    }

    #[test]
    fn recording_line_shows_clock() {
        let presenter = Presenter::new();
        let line = presenter.format_recording(RecorderStatus::Recording, 65);
        assert!(line.contains("REC 01:05"));
        let line = presenter.format_recording(RecorderStatus::Paused, 3);
        assert!(line.contains("PAUSED 00:03"));
    }

    #[test]
    fn segment_line_has_number_range_and_speaker() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let line = presenter.format_segment(2, &segment(), false);
        assert!(line.contains("3. [1:05-1:10]"));
        assert!(line.contains("Speaker 2: Ship it"));
    }

    #[test]
    fn active_segment_is_marked() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        assert!(presenter.format_segment(0, &segment(), true).starts_with('▶'));
        assert!(!presenter.format_segment(0, &segment(), false).starts_with('▶'));
    }
}
