pub mod test_helpers {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::sync::Mutex;

    use crate::error::FetchError;
    use crate::fetch::ResourceLoader;
    use crate::host::{BookProperties, ContentClick, HostCallbacks, PageProperties};
    use crate::language::LangData;
    use crate::media::{Animation, MediaSet, Music, Narration, Video};
    use crate::page::{Orientation, Page, PageFlags, PageSizeClass};
    use crate::tracker::ProgressReport;

    /// In-memory resource loader. Unknown urls answer with a 404.
    #[derive(Default)]
    pub struct MemoryLoader {
        resources: HashMap<String, Result<String, FetchError>>,
        requests: Mutex<Vec<String>>,
    }

    impl MemoryLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.resources.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn failing(mut self, url: &str, status: u16) -> Self {
            self.resources.insert(
                url.to_string(),
                Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
            );
            self
        }

        /// Urls requested so far, sorted so concurrent fetches compare stably.
        pub fn requests(&self) -> Vec<String> {
            let mut requests = self.requests.lock().map(|r| r.clone()).unwrap_or_default();
            requests.sort();
            requests
        }
    }

    impl ResourceLoader for MemoryLoader {
        fn load_text(&self, url: &str) -> Result<String, FetchError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            self.resources.get(url).cloned().unwrap_or_else(|| {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum HostEvent {
        StylesInstalled,
        BookProperties(BookProperties),
        Languages(Vec<LangData>),
        PageProperties(PageProperties),
        ContentClick(ContentClick),
        Progress(ProgressReport),
    }

    /// Host that records every notification. Clones share the same record.
    #[derive(Clone, Default)]
    pub struct RecordingHost {
        events: Rc<RefCell<Vec<HostEvent>>>,
    }

    impl RecordingHost {
        pub fn events(&self) -> Vec<HostEvent> {
            self.events.borrow().clone()
        }

        pub fn take(&self) -> Vec<HostEvent> {
            std::mem::take(&mut *self.events.borrow_mut())
        }
    }

    impl HostCallbacks for RecordingHost {
        fn page_styles_installed(&mut self) {
            self.events.borrow_mut().push(HostEvent::StylesInstalled);
        }

        fn report_book_properties(&mut self, properties: BookProperties) {
            self.events
                .borrow_mut()
                .push(HostEvent::BookProperties(properties));
        }

        fn controls_callback(&mut self, languages: &[LangData]) {
            self.events
                .borrow_mut()
                .push(HostEvent::Languages(languages.to_vec()));
        }

        fn report_page_properties(&mut self, properties: PageProperties) {
            self.events
                .borrow_mut()
                .push(HostEvent::PageProperties(properties));
        }

        fn on_content_click(&mut self, click: &ContentClick) {
            self.events
                .borrow_mut()
                .push(HostEvent::ContentClick(click.clone()));
        }

        fn report_progress(&mut self, report: &ProgressReport) {
            self.events
                .borrow_mut()
                .push(HostEvent::Progress(report.clone()));
        }
    }

    /// Records calls made on the media engines as `"engine.call[:page]"`.
    #[derive(Clone, Default)]
    pub struct MediaLog {
        calls: Rc<RefCell<Vec<String>>>,
        tracked: Rc<Cell<Option<usize>>>,
    }

    impl MediaLog {
        pub fn media_set(&self) -> MediaSet {
            MediaSet {
                narration: Box::new(RecordingEngine::new("narration", self)),
                animation: Box::new(RecordingEngine::new("animation", self)),
                video: Box::new(RecordingEngine::new("video", self)),
                music: Box::new(RecordingEngine::new("music", self)),
            }
        }

        pub fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.borrow_mut())
        }
    }

    struct RecordingEngine {
        name: &'static str,
        log: MediaLog,
    }

    impl RecordingEngine {
        fn new(name: &'static str, log: &MediaLog) -> Self {
            Self {
                name,
                log: log.clone(),
            }
        }

        fn record(&self, call: &str) {
            self.log
                .calls
                .borrow_mut()
                .push(format!("{}.{call}", self.name));
        }
    }

    impl Narration for RecordingEngine {
        fn tracked_page(&self) -> Option<usize> {
            self.log.tracked.get()
        }

        fn compute_duration(&mut self, page: &Page) -> f64 {
            self.log.tracked.set(Some(page.index));
            self.record(&format!("duration:{}", page.index));
            1.0
        }

        fn play_all_sentences(&mut self, page: &Page) {
            self.record(&format!("play:{}", page.index));
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }
    }

    impl Animation for RecordingEngine {
        fn start(&mut self, page: &Page, _duration: f64) {
            self.record(&format!("start:{}", page.index));
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }
    }

    impl Video for RecordingEngine {
        fn start(&mut self, page: &Page) {
            self.record(&format!("start:{}", page.index));
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }
    }

    impl Music for RecordingEngine {
        fn start(&mut self, page: &Page) {
            self.record(&format!("start:{}", page.index));
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }
    }

    pub fn page_with_flags(index: usize, flags: PageFlags) -> Page {
        Page {
            index,
            markup: format!(r#"<div class="bloom-page" data-page-index="{index}"></div>"#),
            original_size: None,
            size: PageSizeClass::device(Orientation::Portrait),
            flags,
            page_number: None,
        }
    }

    /// Markup for a small book: a front cover, `numbered` story pages and a
    /// back cover. Story pages have English and French text.
    pub fn sample_book_html(numbered: usize) -> String {
        let mut pages = String::from(
            r#"<div class="bloom-page A5Portrait" data-xmatter-page="frontCover" data-page-number=""><div class="bloom-translationGroup" data-default-languages="V"><div class="bloom-editable" lang="en" contenteditable="true">Cover</div></div></div>"#,
        );
        for n in 1..=numbered {
            pages.push_str(&format!(
                r#"<div class="bloom-page numberedPage A5Portrait" data-page-number="{n}"><div class="bloom-imageContainer"><img src="page{n}.png"></div><div class="bloom-translationGroup" data-default-languages="auto"><div class="bloom-editable" lang="en" contenteditable="true"><span class="audio-sentence">Page {n}</span></div><div class="bloom-editable" lang="fr" contenteditable="true">Page {n} fr</div></div></div>"#
            ));
        }
        pages.push_str(
            r#"<div class="bloom-page A5Portrait" data-xmatter-page="backCover" data-page-number=""></div>"#,
        );
        format!(
            r#"<!DOCTYPE html><html><head><style>.a{{color:red}}</style><link rel="stylesheet" href="custom.css"><link rel="stylesheet" href="fonts.css"></head><body data-bfcanrotate="allOrientations;bloomReader"><div id="bloomDataDiv"><div data-book="contentLanguage1" lang="*">en</div><div data-book="contentLanguage2" lang="*">fr</div></div>{pages}</body></html>"#
        )
    }

    pub const SAMPLE_META: &str = r#"{"title":"Sample","bookInstanceId":"sample-1","language-display-names":{"en":"English","fr":"French"}}"#;

    /// Loader serving `sample_book_html` at `https://host/Sample`.
    pub fn sample_loader(numbered: usize) -> MemoryLoader {
        MemoryLoader::new()
            .with("https://host/Sample/Sample.htm", &sample_book_html(numbered))
            .with("https://host/Sample/meta.json", SAMPLE_META)
            .with("https://host/Sample/custom.css", ".custom{margin:0}")
            .with(
                "https://host/Sample/fonts.css",
                "@font-face{font-family:Andika;src:url(Andika.woff)}",
            )
    }
}
