use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::page::Page;

/// Reading analytics pushed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub pages_read: usize,
    pub total_numbered_pages: usize,
    pub question_count: usize,
    pub audio_seconds: f64,
    pub video_seconds: f64,
    pub last_numbered_page_read: bool,
    /// Only set on the final report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

/// Counts what the reader has seen and heard of the current book.
#[derive(Debug, Default)]
pub struct InteractionTracker {
    pages_read: BTreeSet<usize>,
    audio_seconds: f64,
    video_seconds: f64,
    last_numbered_page_read: bool,
    audio_reported: bool,
    video_reported: bool,
    total_numbered_pages: usize,
    question_count: usize,
    properties: BTreeMap<String, Value>,
}

impl InteractionTracker {
    pub fn new(
        total_numbered_pages: usize,
        question_count: usize,
        properties: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            total_numbered_pages,
            question_count,
            properties,
            ..Default::default()
        }
    }

    /// Records that `page` was shown. `last_numbered` is the index of the
    /// book's last numbered page.
    pub fn page_shown(&mut self, page: &Page, last_numbered: Option<usize>) {
        self.audio_reported = false;
        self.video_reported = false;
        if page.flags.is_xmatter {
            return;
        }
        if page.flags.is_numbered {
            self.pages_read.insert(page.index);
        }
        if last_numbered == Some(page.index) {
            debug!("Last numbered page {} reached", page.index);
            self.last_numbered_page_read = true;
        }
    }

    pub fn add_audio_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.audio_seconds += seconds;
            self.audio_reported = true;
        }
    }

    pub fn add_video_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.video_seconds += seconds;
            self.video_reported = true;
        }
    }

    /// Whether any audio was played on the current page.
    pub fn audio_reported(&self) -> bool {
        self.audio_reported
    }

    pub fn video_reported(&self) -> bool {
        self.video_reported
    }

    pub fn last_numbered_page_read(&self) -> bool {
        self.last_numbered_page_read
    }

    pub fn progress_report(&self) -> ProgressReport {
        ProgressReport {
            pages_read: self.pages_read.len(),
            total_numbered_pages: self.total_numbered_pages,
            question_count: self.question_count,
            audio_seconds: self.audio_seconds,
            video_seconds: self.video_seconds,
            last_numbered_page_read: self.last_numbered_page_read,
            completed: None,
            properties: self.properties.clone(),
        }
    }

    /// Report sent when the book is closed.
    pub fn final_report(&self) -> ProgressReport {
        ProgressReport {
            completed: Some(self.last_numbered_page_read),
            ..self.progress_report()
        }
    }
}
