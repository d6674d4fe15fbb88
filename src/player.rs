use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, error, info};

use crate::book::Book;
use crate::carousel::{CarouselEvent, Effect, LoadState, PageCarouselController, RenderedSlide};
use crate::config::PlayerConfig;
use crate::error::LoadError;
use crate::fetch::{fetch_book, ResourceLoader};
use crate::host::{ActivityHandler, ContentClick, HostCallbacks, NoActivity, PageProperties};
use crate::media::{MediaCoordinator, MediaSet};
use crate::rewrite::{rewrite_book, RewriteOptions};
use crate::scheduler::TaskQueue;
use crate::source::BookLocation;
use crate::tracker::{InteractionTracker, ProgressReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Settle { generation: u64 },
    PageShown { generation: u64, page: usize },
}

/// One book viewer: loads a book, pages through it and keeps media and
/// analytics in step with the visible page.
pub struct BookPlayer {
    config: PlayerConfig,
    loader: Box<dyn ResourceLoader>,
    host: Box<dyn HostCallbacks>,
    activity: Box<dyn ActivityHandler>,
    carousel: PageCarouselController,
    media: MediaCoordinator,
    tracker: InteractionTracker,
    queue: TaskQueue<Task>,
    styles_installed: bool,
}

impl BookPlayer {
    pub fn new(
        config: PlayerConfig,
        loader: Box<dyn ResourceLoader>,
        host: Box<dyn HostCallbacks>,
        media: MediaSet,
    ) -> Self {
        let carousel = PageCarouselController::new(
            config.show_context_pages,
            config.landscape,
            config.use_original_page_size,
        );
        let media = MediaCoordinator::new(media, config.paused);
        Self {
            config,
            loader,
            host,
            activity: Box::new(NoActivity),
            carousel,
            media,
            tracker: InteractionTracker::default(),
            queue: TaskQueue::new(),
            styles_installed: false,
        }
    }

    pub fn with_activity(mut self, activity: Box<dyn ActivityHandler>) -> Self {
        self.activity = activity;
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> &LoadState {
        self.carousel.state()
    }

    pub fn carousel(&self) -> &PageCarouselController {
        &self.carousel
    }

    pub fn book(&self) -> Option<&Book> {
        self.carousel.book()
    }

    pub fn rendered_slides(&self) -> Vec<RenderedSlide<'_>> {
        self.carousel.rendered_slides()
    }

    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    /// Loads the book named by the configured url.
    pub fn load(&mut self) -> Result<(), LoadError> {
        let url = self.config.url.clone();
        self.set_source(&url)
    }

    pub fn set_source(&mut self, url: &str) -> Result<(), LoadError> {
        self.config.url = url.to_string();
        self.dispatch(CarouselEvent::SourceChanged(url.to_string()))
    }

    pub fn go_to(&mut self, page: usize) -> Result<(), LoadError> {
        self.dispatch(CarouselEvent::GoTo { page })
    }

    pub fn next(&mut self) -> Result<(), LoadError> {
        self.dispatch(CarouselEvent::Next)
    }

    pub fn previous(&mut self) -> Result<(), LoadError> {
        self.dispatch(CarouselEvent::Previous)
    }

    /// `None` means the language menu closed without a choice.
    pub fn set_language(&mut self, code: Option<&str>) -> Result<(), LoadError> {
        let Some(code) = code else {
            return Ok(());
        };
        self.config.active_language = Some(code.to_string());
        self.dispatch(CarouselEvent::LanguageChanged(code.to_string()))
    }

    pub fn set_landscape(&mut self, landscape: bool) -> Result<(), LoadError> {
        self.config.landscape = landscape;
        self.dispatch(CarouselEvent::OrientationChanged { landscape })
    }

    pub fn set_use_original_page_size(&mut self, use_original: bool) -> Result<(), LoadError> {
        self.config.use_original_page_size = use_original;
        self.dispatch(CarouselEvent::OriginalPageSizeChanged { use_original })
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.config.paused = paused;
        // Before the settle nothing is playing yet; the settle starts the page.
        let current = if self.carousel.settle_pending() {
            None
        } else {
            self.carousel.current_page()
        };
        self.media.set_paused(paused, current);
    }

    pub fn is_paused(&self) -> bool {
        self.media.is_paused()
    }

    pub fn pause_all(&mut self) {
        self.media.pause_all();
    }

    /// Narration engine finished playing `seconds` of audio.
    pub fn on_audio_played(&mut self, seconds: f64) {
        self.tracker.add_audio_duration(seconds);
    }

    pub fn on_video_played(&mut self, seconds: f64) {
        self.tracker.add_video_duration(seconds);
    }

    /// Forwards a click on page content to the host unless the page's
    /// activity uses it.
    pub fn content_click(&mut self, click: ContentClick) {
        if let Some(page) = self.carousel.current_page() {
            if self.activity.handle_click(page, &click) {
                debug!("Click on page {} absorbed by activity", page.index);
                return;
            }
        }
        self.host.on_content_click(&click);
    }

    /// Stops media and sends the closing analytics report.
    pub fn close(&mut self) -> ProgressReport {
        self.media.pause_all();
        self.queue.clear();
        let report = self.tracker.final_report();
        self.host.report_progress(&report);
        report
    }

    /// Moves the scheduler clock forward and runs whatever became due.
    pub fn advance(&mut self, elapsed: Duration) -> Result<(), LoadError> {
        self.queue.advance(elapsed);
        self.run_pending()
    }

    /// Runs every task that is due now, including ones they queue.
    pub fn run_pending(&mut self) -> Result<(), LoadError> {
        while let Some(task) = self.queue.pop_due() {
            self.run_task(task)?;
        }
        Ok(())
    }

    /// Runs queued work until nothing is left, moving the clock as needed.
    pub fn run_until_idle(&mut self) -> Result<(), LoadError> {
        self.run_pending()?;
        while let Some(wait) = self.queue.next_due_in() {
            self.advance(wait)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: CarouselEvent) -> Result<(), LoadError> {
        let mut pending: VecDeque<Effect> = self.carousel.handle(event)?.into();
        while let Some(effect) = pending.pop_front() {
            if let Some(next) = self.apply(effect) {
                pending.extend(self.carousel.handle(next)?);
            }
        }
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> Option<CarouselEvent> {
        match effect {
            Effect::StartFetch(location) => return Some(self.fetch(location)),
            Effect::BookLoaded => self.book_loaded(),
            Effect::ReportBookProperties(properties) => {
                self.host.report_book_properties(properties);
            }
            Effect::ProvideLanguages(languages) => self.host.controls_callback(&languages),
            Effect::ScheduleSettle { generation, delay } => {
                self.queue.after(delay, Task::Settle { generation });
            }
            Effect::PageShown { generation, page } => {
                // Activities change what the page shows, so they go first;
                // everything else waits for the next turn.
                if let Some(shown) = self.carousel.book().and_then(|b| b.page(page)) {
                    self.activity
                        .page_shown(shown, &self.config.location_of_dist_folder);
                }
                self.queue.next_turn(Task::PageShown { generation, page });
            }
            Effect::SlidesChanged => debug!("Regenerated carousel slides"),
            Effect::ShowError(message) => {
                error!("Showing load failure: {message}");
                self.media.pause_all();
            }
        }
        None
    }

    fn fetch(&mut self, location: BookLocation) -> CarouselEvent {
        let options = RewriteOptions {
            landscape: self.config.landscape,
            use_original_page_size: self.config.use_original_page_size,
            active_language: self.config.active_language.clone(),
        };
        let loader = self.loader.as_ref();
        let result = fetch_book(loader, &location)
            .and_then(|fetched| rewrite_book(&fetched, &options, loader));
        match result {
            Ok(book) => CarouselEvent::FetchSucceeded {
                source: location.raw,
                book: Box::new(book),
            },
            Err(error) => CarouselEvent::FetchFailed {
                source: location.raw,
                error,
            },
        }
    }

    fn book_loaded(&mut self) {
        self.media.pause_all();
        let Some(book) = self.carousel.book() else {
            return;
        };
        self.tracker = InteractionTracker::new(
            book.metadata.numbered_page_count,
            book.metadata.question_page_count,
            book.metadata.analytics.clone(),
        );
        if !self.styles_installed {
            info!(
                "Installing page styles ({} bytes, font sheet: {})",
                book.styles.combined.len(),
                book.styles.fonts.is_some()
            );
            self.styles_installed = true;
            self.host.page_styles_installed();
        }
    }

    fn run_task(&mut self, task: Task) -> Result<(), LoadError> {
        match task {
            Task::Settle { generation } => self.dispatch(CarouselEvent::Settled { generation }),
            Task::PageShown { generation, page } => {
                self.finish_page_shown(generation, page);
                Ok(())
            }
        }
    }

    fn finish_page_shown(&mut self, generation: u64, index: usize) {
        if generation != self.carousel.generation() {
            debug!("Dropping page-shown work for a replaced book");
            return;
        }
        self.carousel.normalize_page(index);
        let Some(book) = self.carousel.book() else {
            return;
        };
        let Some(page) = book.page(index) else {
            return;
        };

        self.media.page_shown(page);
        self.tracker.page_shown(page, book.last_numbered_page());
        self.host.report_page_properties(PageProperties {
            has_audio: page.flags.has_audio,
            has_music: page.flags.has_music,
            has_video: page.flags.has_video,
        });
        let report = self.tracker.progress_report();
        self.host.report_progress(&report);
    }
}
