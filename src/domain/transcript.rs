//! Transcript and analysis records, as delivered by the note service

use serde::{Deserialize, Serialize};

/// A timed span of transcript text attributed to one speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TranscriptSegment {
    /// Half-open containment: `start <= time < end`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Display label for the speaker tag
    pub fn speaker_label(&self) -> String {
        speaker_label(&self.speaker)
    }
}

/// Full transcript of a note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub full_text: Option<String>,
}

/// Indices of every segment containing `time`
pub fn active_indices(segments: &[TranscriptSegment], time: f64) -> Vec<usize> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, seg)| seg.contains(time))
        .map(|(i, _)| i)
        .collect()
}

/// Turn `SPEAKER_00` into `Speaker 1`; other tags pass through unchanged
pub fn speaker_label(tag: &str) -> String {
    tag.strip_prefix("SPEAKER_")
        .and_then(|n| n.parse::<u32>().ok())
        .map(|n| format!("Speaker {}", n + 1))
        .unwrap_or_else(|| tag.to_string())
}

/// One action item; the analyzer emits either plain strings or records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionItem {
    Text(String),
    Detailed {
        text: String,
        #[serde(default)]
        assignee: Option<String>,
        #[serde(default)]
        deadline: Option<String>,
    },
}

impl ActionItem {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Detailed { text, .. } => text,
        }
    }

    pub fn assignee(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Detailed { assignee, .. } => assignee.as_deref(),
        }
    }

    pub fn deadline(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Detailed { deadline, .. } => deadline.as_deref(),
        }
    }
}

/// AI analysis of a note. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub action_items: Option<Vec<ActionItem>>,
}

impl Analysis {
    pub fn topics(&self) -> &[String] {
        self.topics.as_deref().unwrap_or_default()
    }

    pub fn keywords(&self) -> &[String] {
        self.keywords.as_deref().unwrap_or_default()
    }

    pub fn action_items(&self) -> &[ActionItem] {
        self.action_items.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.as_deref().map_or(true, str::is_empty)
            && self.topics().is_empty()
            && self.keywords().is_empty()
            && self.action_items().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64) -> TranscriptSegment {
        TranscriptSegment {
            speaker: "SPEAKER_00".to_string(),
            start,
            end,
            text: "hello".to_string(),
            confidence: None,
        }
    }

    #[test]
    fn containment_is_half_open() {
        let segments = vec![segment(0.0, 5.0), segment(5.0, 10.0)];
        assert_eq!(active_indices(&segments, 4.9), vec![0]);
        assert_eq!(active_indices(&segments, 5.0), vec![1]);
        assert!(active_indices(&segments, 10.0).is_empty());
    }

    #[test]
    fn overlapping_segments_are_all_active() {
        let segments = vec![segment(0.0, 6.0), segment(5.0, 10.0)];
        assert_eq!(active_indices(&segments, 5.5), vec![0, 1]);
    }

    #[test]
    fn speaker_labels() {
        assert_eq!(speaker_label("SPEAKER_00"), "Speaker 1");
        assert_eq!(speaker_label("SPEAKER_03"), "Speaker 4");
        assert_eq!(speaker_label("Alice"), "Alice");
        assert_eq!(speaker_label("SPEAKER_x"), "SPEAKER_x");
    }

    #[test]
    fn transcript_parses_service_payload() {
        let json = r#"{
            "id": "9b1c", "note_id": "77aa",
            "segments": [{"speaker": "SPEAKER_01", "start": 0.0, "end": 2.5, "text": "hi", "confidence": 0.9}],
            "full_text": "hi"
        }"#;
        let transcript: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].confidence, Some(0.9));
        assert_eq!(transcript.full_text.as_deref(), Some("hi"));
    }

    #[test]
    fn action_items_accept_both_shapes() {
        let json = r#"{
            "summary": "Weekly sync",
            "topics": ["roadmap"],
            "keywords": null,
            "action_items": ["ship it", {"text": "write notes", "assignee": "Kim", "deadline": null}]
        }"#;
        let analysis: Analysis = serde_json::from_str(json).unwrap();
        let items = analysis.action_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text(), "ship it");
        assert_eq!(items[1].text(), "write notes");
        assert_eq!(items[1].assignee(), Some("Kim"));
        assert!(analysis.keywords().is_empty());
        assert!(!analysis.is_empty());
    }

    #[test]
    fn empty_analysis() {
        let analysis: Analysis = serde_json::from_str("{}").unwrap();
        assert!(analysis.is_empty());
    }
}
