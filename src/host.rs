use serde::Serialize;

use crate::language::LangData;
use crate::page::Page;
use crate::tracker::ProgressReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookProperties {
    pub landscape: bool,
    pub can_rotate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProperties {
    pub has_audio: bool,
    pub has_music: bool,
    pub has_video: bool,
}

/// A tap or click on page content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentClick {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    /// Element id under the pointer, if any.
    pub target_id: Option<String>,
}

/// Notifications pushed to the hosting application. All of them are
/// fire-and-forget.
pub trait HostCallbacks {
    /// Sent once, the first time book styles are installed.
    fn page_styles_installed(&mut self) {}

    /// Sent once per newly loaded book.
    fn report_book_properties(&mut self, _properties: BookProperties) {}

    /// Sent once per newly loaded book with the full language list.
    fn controls_callback(&mut self, _languages: &[LangData]) {}

    /// Sent every time a page is shown.
    fn report_page_properties(&mut self, _properties: PageProperties) {}

    fn on_content_click(&mut self, _click: &ContentClick) {}

    fn report_progress(&mut self, _report: &ProgressReport) {}
}

/// Page-local interactive activities (quizzes, games). Told about a page
/// before anything else so it can set the page up.
pub trait ActivityHandler {
    fn page_shown(&mut self, _page: &Page, _dist_folder: &str) {}

    /// Returns true when the activity used the click.
    fn handle_click(&mut self, _page: &Page, _click: &ContentClick) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct NoActivity;

impl ActivityHandler for NoActivity {}
