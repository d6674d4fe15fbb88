//! Start/stop coordination of the per-page media engines.
//!
//! The engines themselves (narration, pan-and-zoom animation, video, background
//! music) live outside this crate; they are handed to the coordinator when it
//! is built.

use log::{debug, trace};

use crate::page::Page;

pub trait Narration {
    /// Page the narration engine last set up, if any.
    fn tracked_page(&self) -> Option<usize>;
    /// Total narration time of `page` in seconds.
    fn compute_duration(&mut self, page: &Page) -> f64;
    /// Reads `page` sentence by sentence.
    fn play_all_sentences(&mut self, page: &Page);
    fn pause(&mut self);
    fn resume(&mut self);
}

pub trait Animation {
    /// Starts the page's pan-and-zoom animation, lasting `duration` seconds.
    fn start(&mut self, page: &Page, duration: f64);
    fn pause(&mut self);
    fn resume(&mut self);
}

pub trait Video {
    fn start(&mut self, page: &Page);
    fn pause(&mut self);
    fn resume(&mut self);
}

pub trait Music {
    fn start(&mut self, page: &Page);
    fn pause(&mut self);
    fn resume(&mut self);
}

/// The media engines of one player instance.
pub struct MediaSet {
    pub narration: Box<dyn Narration>,
    pub animation: Box<dyn Animation>,
    pub video: Box<dyn Video>,
    pub music: Box<dyn Music>,
}

impl MediaSet {
    /// A set whose engines do nothing, for hosts without media support.
    pub fn silent() -> Self {
        Self {
            narration: Box::new(Silent::default()),
            animation: Box::new(Silent::default()),
            video: Box::new(Silent::default()),
            music: Box::new(Silent::default()),
        }
    }
}

pub struct MediaCoordinator {
    media: MediaSet,
    paused: bool,
}

impl MediaCoordinator {
    pub fn new(media: MediaSet, paused: bool) -> Self {
        Self { media, paused }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool, current: Option<&Page>) {
        if paused {
            self.pause_all();
            self.paused = true;
        } else if self.paused {
            self.paused = false;
            if let Some(page) = current {
                self.resume_current(page);
            }
        }
    }

    /// Stops everything. Safe to call any number of times.
    pub fn pause_all(&mut self) {
        trace!("Pausing all media");
        self.media.narration.pause();
        self.media.animation.pause();
        self.media.video.pause();
        self.media.music.pause();
    }

    /// Continues playback for `page`. If the narration engine was last set up
    /// for some other page (the page changed while paused), the page is
    /// started from scratch instead.
    pub fn resume_current(&mut self, page: &Page) {
        if self.paused {
            return;
        }
        if self.media.narration.tracked_page() != Some(page.index) {
            debug!("Page changed while paused, restarting media for page {}", page.index);
            self.reset_and_play(page);
            return;
        }
        self.media.narration.resume();
        self.media.animation.resume();
        self.media.video.resume();
        self.media.music.resume();
    }

    /// Media part of showing a page. Nothing starts while paused.
    pub fn page_shown(&mut self, page: &Page) {
        self.pause_all();
        if !self.paused {
            self.reset_and_play(page);
        }
    }

    fn reset_and_play(&mut self, page: &Page) {
        let duration = self.media.narration.compute_duration(page);
        self.media.narration.play_all_sentences(page);
        if page.flags.has_animation {
            self.media.animation.start(page, duration);
        }
        self.media.video.start(page);
        self.media.music.start(page);
    }
}

#[derive(Debug, Default)]
struct Silent {
    tracked: Option<usize>,
}

impl Narration for Silent {
    fn tracked_page(&self) -> Option<usize> {
        self.tracked
    }

    fn compute_duration(&mut self, page: &Page) -> f64 {
        self.tracked = Some(page.index);
        0.0
    }

    fn play_all_sentences(&mut self, _page: &Page) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

impl Animation for Silent {
    fn start(&mut self, _page: &Page, _duration: f64) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

impl Video for Silent {
    fn start(&mut self, _page: &Page) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

impl Music for Silent {
    fn start(&mut self, _page: &Page) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{page_with_flags, MediaLog};
    use crate::page::PageFlags;

    fn coordinator(paused: bool) -> (MediaCoordinator, MediaLog) {
        let log = MediaLog::default();
        (MediaCoordinator::new(log.media_set(), paused), log)
    }

    #[test]
    fn test_pause_all_is_idempotent() {
        let (mut media, log) = coordinator(false);
        media.pause_all();
        media.pause_all();
        assert_eq!(
            log.take(),
            vec![
                "narration.pause", "animation.pause", "video.pause", "music.pause",
                "narration.pause", "animation.pause", "video.pause", "music.pause",
            ]
        );
    }

    #[test]
    fn test_page_shown_plays_in_order() {
        let (mut media, log) = coordinator(false);
        let page = page_with_flags(2, PageFlags {
            has_animation: true,
            ..Default::default()
        });
        media.page_shown(&page);
        let calls = log.take();
        let start = calls.iter().position(|c| c == "narration.duration:2").unwrap();
        assert_eq!(
            &calls[start..],
            &[
                "narration.duration:2",
                "narration.play:2",
                "animation.start:2",
                "video.start:2",
                "music.start:2",
            ]
        );
    }

    #[test]
    fn test_no_animation_without_flag_and_nothing_while_paused() {
        let (mut media, log) = coordinator(false);
        media.page_shown(&page_with_flags(0, PageFlags::default()));
        assert!(!log.take().iter().any(|c| c.starts_with("animation.start")));

        let (mut media, log) = coordinator(true);
        media.page_shown(&page_with_flags(0, PageFlags::default()));
        assert!(log.take().iter().all(|c| c.ends_with(".pause")));
    }

    #[test]
    fn test_resume_restarts_when_page_changed_while_paused() {
        let (mut media, log) = coordinator(false);
        media.page_shown(&page_with_flags(1, PageFlags::default()));
        media.set_paused(true, None);
        log.take();

        // Page 2 was swapped in while paused.
        media.set_paused(false, Some(&page_with_flags(2, PageFlags::default())));
        let calls = log.take();
        assert!(calls.contains(&"narration.play:2".to_string()));
        assert!(!calls.contains(&"narration.resume".to_string()));
    }

    #[test]
    fn test_resume_same_page_just_resumes() {
        let (mut media, log) = coordinator(false);
        let page = page_with_flags(1, PageFlags::default());
        media.page_shown(&page);
        media.set_paused(true, None);
        log.take();
        media.set_paused(false, Some(&page));
        assert_eq!(
            log.take(),
            vec!["narration.resume", "animation.resume", "video.resume", "music.resume"]
        );
    }

    #[test]
    fn test_resume_is_ignored_while_paused() {
        let (mut media, log) = coordinator(true);
        media.resume_current(&page_with_flags(0, PageFlags::default()));
        assert!(log.take().is_empty());
    }
}
