//! Page carousel state machine.
//!
//! Every input is an [`CarouselEvent`]; handling one updates the state and
//! returns the [`Effect`]s the caller has to carry out, in order. Nothing in
//! here does I/O or talks to the host directly.

use std::time::Duration;

use log::{debug, info, warn};

use crate::book::Book;
use crate::error::LoadError;
use crate::host::BookProperties;
use crate::language::LangData;
use crate::page::Page;
use crate::rewrite::{apply_size_class, choose_size_class, mutate_page};
use crate::source::{BookLocation, SourceUrl};

/// Time given to the first layout before the first page is shown.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Pages further than this from the current one render as placeholders.
pub const MATERIALIZE_WINDOW: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed { message_html: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slide {
    /// Blank slot before the first or after the last page.
    Context,
    Page(usize),
}

/// What the carousel shows in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderedSlide<'a> {
    Context,
    /// A page too far from the current one to be worth building.
    Placeholder { page: usize },
    Page { page: usize, markup: &'a str },
}

#[derive(Debug)]
pub enum CarouselEvent {
    SourceChanged(String),
    FetchSucceeded { source: String, book: Box<Book> },
    FetchFailed { source: String, error: LoadError },
    /// The settle delay after loading has passed.
    Settled { generation: u64 },
    LanguageChanged(String),
    OrientationChanged { landscape: bool },
    OriginalPageSizeChanged { use_original: bool },
    GoTo { page: usize },
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartFetch(BookLocation),
    /// A new book replaced whatever was loaded before.
    BookLoaded,
    ReportBookProperties(BookProperties),
    ProvideLanguages(Vec<LangData>),
    ScheduleSettle { generation: u64, delay: Duration },
    /// `page` became current. Carries the load generation so deferred work
    /// for a replaced book can be dropped.
    PageShown { generation: u64, page: usize },
    SlidesChanged,
    ShowError(String),
}

#[derive(Debug)]
pub struct PageCarouselController {
    state: LoadState,
    source: Option<String>,
    generation: u64,
    book: Option<Book>,
    slides: Vec<Slide>,
    current: usize,
    slides_finalized: bool,
    settle_pending: bool,
    show_context_pages: bool,
    landscape: bool,
    use_original_page_size: bool,
}

impl PageCarouselController {
    pub fn new(show_context_pages: bool, landscape: bool, use_original_page_size: bool) -> Self {
        Self {
            state: LoadState::Loading,
            source: None,
            generation: 0,
            book: None,
            slides: Vec::new(),
            current: 0,
            slides_finalized: false,
            settle_pending: false,
            show_context_pages,
            landscape,
            use_original_page_size,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current_slide(&self) -> usize {
        self.current
    }

    pub fn slides_finalized(&self) -> bool {
        self.slides_finalized
    }

    /// A book is loaded but its first page hasn't been shown yet.
    pub fn settle_pending(&self) -> bool {
        self.settle_pending
    }

    pub fn landscape(&self) -> bool {
        self.landscape
    }

    pub fn use_original_page_size(&self) -> bool {
        self.use_original_page_size
    }

    pub fn current_page_index(&self) -> Option<usize> {
        match self.slides.get(self.current) {
            Some(Slide::Page(page)) => Some(*page),
            _ => None,
        }
    }

    pub fn current_page(&self) -> Option<&Page> {
        let index = self.current_page_index()?;
        self.book.as_ref()?.page(index)
    }

    pub fn handle(&mut self, event: CarouselEvent) -> Result<Vec<Effect>, LoadError> {
        let effects = match event {
            CarouselEvent::SourceChanged(raw) => return self.on_source_changed(raw),
            CarouselEvent::FetchSucceeded { source, book } => {
                self.on_fetch_succeeded(source, *book)
            }
            CarouselEvent::FetchFailed { source, error } => self.on_fetch_failed(source, error),
            CarouselEvent::Settled { generation } => self.on_settled(generation),
            CarouselEvent::LanguageChanged(code) => self.on_language_changed(&code),
            CarouselEvent::OrientationChanged { landscape } => {
                self.landscape = landscape;
                self.resize_pages()
            }
            CarouselEvent::OriginalPageSizeChanged { use_original } => {
                self.use_original_page_size = use_original;
                self.resize_pages()
            }
            CarouselEvent::GoTo { page } => {
                self.go_to_slide(page.saturating_add(self.page_offset()))
            }
            CarouselEvent::Next => self.go_to_slide(self.current + 1),
            CarouselEvent::Previous => match self.current.checked_sub(1) {
                Some(slide) => self.go_to_slide(slide),
                None => Vec::new(),
            },
        };
        Ok(effects)
    }

    fn on_source_changed(&mut self, raw: String) -> Result<Vec<Effect>, LoadError> {
        if self.source.as_deref() == Some(raw.as_str()) {
            // Same book: a failed load stays failed, a loaded book stays put.
            return Ok(Vec::new());
        }
        let parsed = SourceUrl::parse(&raw)?;

        self.generation += 1;
        self.source = Some(raw);
        self.state = LoadState::Loading;
        self.book = None;
        self.slides.clear();
        self.current = 0;
        self.slides_finalized = false;
        self.settle_pending = false;

        match parsed {
            SourceUrl::Preparing => {
                debug!("Book is still being prepared");
                Ok(Vec::new())
            }
            SourceUrl::Book(location) => Ok(vec![Effect::StartFetch(location)]),
        }
    }

    fn is_current_source(&self, source: &str) -> bool {
        self.source.as_deref() == Some(source)
    }

    fn on_fetch_succeeded(&mut self, source: String, book: Book) -> Vec<Effect> {
        if !self.is_current_source(&source) {
            warn!("Ignoring book from superseded source {source}");
            return Vec::new();
        }
        if self.state != LoadState::Loading {
            return Vec::new();
        }

        let mut book = book;
        let request = book.size_request(self.landscape, self.use_original_page_size);
        let landscape = book.apply_size_request(request);
        info!(
            "Book ready: {} pages, {} numbered",
            book.pages.len(),
            book.metadata.numbered_page_count
        );

        let properties = BookProperties {
            landscape,
            can_rotate: book.metadata.can_rotate,
        };
        let languages = book.metadata.languages.clone();

        self.slides = Self::build_slides(book.pages.len(), self.show_context_pages);
        self.book = Some(book);
        self.current = self.first_page_slide();
        self.slides_finalized = true;
        self.settle_pending = true;
        self.state = LoadState::Ready;

        vec![
            Effect::BookLoaded,
            Effect::ReportBookProperties(properties),
            Effect::ProvideLanguages(languages),
            Effect::ScheduleSettle {
                generation: self.generation,
                delay: SETTLE_DELAY,
            },
        ]
    }

    fn on_fetch_failed(&mut self, source: String, error: LoadError) -> Vec<Effect> {
        if !self.is_current_source(&source) {
            warn!("Ignoring failure from superseded source {source}: {error}");
            return Vec::new();
        }
        warn!("Book failed to load: {error}");
        let message_html = error.user_message_html();
        self.state = LoadState::Failed {
            message_html: message_html.clone(),
        };
        self.book = None;
        self.slides.clear();
        self.current = 0;
        self.settle_pending = false;
        vec![Effect::ShowError(message_html)]
    }

    fn on_settled(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation || !self.settle_pending {
            return Vec::new();
        }
        self.settle_pending = false;
        self.current = self.first_page_slide();
        self.page_shown_effect().into_iter().collect()
    }

    fn on_language_changed(&mut self, code: &str) -> Vec<Effect> {
        let Some(book) = self.book.as_mut() else {
            return Vec::new();
        };
        if book.active_language.as_deref() == Some(code) || !book.select_language(code) {
            return Vec::new();
        }
        if self.slides_finalized {
            vec![Effect::SlidesChanged]
        } else {
            Vec::new()
        }
    }

    fn resize_pages(&mut self) -> Vec<Effect> {
        let Some(book) = self.book.as_mut() else {
            return Vec::new();
        };
        let request = book.size_request(self.landscape, self.use_original_page_size);
        book.apply_size_request(request);
        vec![Effect::SlidesChanged]
    }

    /// Re-applies the size class of one page if it drifted from the current
    /// orientation settings.
    pub fn normalize_page(&mut self, index: usize) {
        let Some(book) = self.book.as_mut() else {
            return;
        };
        let request = book.size_request(self.landscape, self.use_original_page_size);
        let Some(page) = book.pages.get_mut(index) else {
            return;
        };
        let (size, _) = choose_size_class(page.original_size.as_ref(), request);
        if size != page.size {
            mutate_page(page, |node| apply_size_class(node, &size));
            page.size = size;
        }
    }

    fn go_to_slide(&mut self, slide: usize) -> Vec<Effect> {
        if self.state != LoadState::Ready || self.settle_pending {
            return Vec::new();
        }
        let Some(page_count) = self.book.as_ref().map(|b| b.pages.len()) else {
            return Vec::new();
        };
        if page_count == 0 {
            return Vec::new();
        }
        let first = self.page_offset();
        let last = first + page_count - 1;
        let slide = slide.clamp(first, last);
        if slide == self.current {
            return Vec::new();
        }
        self.current = slide;
        self.page_shown_effect().into_iter().collect()
    }

    fn page_shown_effect(&self) -> Option<Effect> {
        self.current_page_index().map(|page| Effect::PageShown {
            generation: self.generation,
            page,
        })
    }

    fn page_offset(&self) -> usize {
        usize::from(self.show_context_pages)
    }

    fn first_page_slide(&self) -> usize {
        match self.book.as_ref() {
            Some(book) if !book.pages.is_empty() => self.page_offset(),
            _ => 0,
        }
    }

    fn build_slides(page_count: usize, show_context_pages: bool) -> Vec<Slide> {
        let mut slides = Vec::with_capacity(page_count + 2);
        if show_context_pages {
            slides.push(Slide::Context);
        }
        slides.extend((0..page_count).map(Slide::Page));
        if show_context_pages {
            slides.push(Slide::Context);
        }
        slides
    }

    /// The slides as they should be rendered now. Only pages next to the
    /// current one get real markup. Empty unless a book is ready.
    pub fn rendered_slides(&self) -> Vec<RenderedSlide<'_>> {
        let Some(book) = self.book.as_ref().filter(|_| self.state == LoadState::Ready) else {
            return Vec::new();
        };
        self.slides
            .iter()
            .enumerate()
            .map(|(slot, slide)| match *slide {
                Slide::Context => RenderedSlide::Context,
                Slide::Page(page) if slot.abs_diff(self.current) <= MATERIALIZE_WINDOW => {
                    RenderedSlide::Page {
                        page,
                        markup: &book.pages[page].markup,
                    }
                }
                Slide::Page(page) => RenderedSlide::Placeholder { page },
            })
            .collect()
    }
}
