use bookplayer::book::Book;
use bookplayer::carousel::{CarouselEvent, Effect, Slide, SETTLE_DELAY};
use bookplayer::error::LoadError;
use bookplayer::fetch::fetch_book;
use bookplayer::rewrite::{rewrite_book, RewriteOptions};
use bookplayer::source::{BookLocation, SourceUrl};
use bookplayer::test_utils::test_helpers::sample_loader;
use bookplayer::{LoadState, PageCarouselController};

const SAMPLE_URL: &str = "https://host/Sample";

fn sample_book(numbered: usize) -> Book {
    let loader = sample_loader(numbered);
    let location = match SourceUrl::parse(SAMPLE_URL).unwrap() {
        SourceUrl::Book(location) => location,
        SourceUrl::Preparing => unreachable!(),
    };
    let fetched = fetch_book(&loader, &location).unwrap();
    rewrite_book(&fetched, &RewriteOptions::default(), &loader).unwrap()
}

fn start(controller: &mut PageCarouselController, url: &str) -> BookLocation {
    let effects = controller
        .handle(CarouselEvent::SourceChanged(url.to_string()))
        .unwrap();
    match effects.as_slice() {
        [Effect::StartFetch(location)] => location.clone(),
        other => panic!("expected a fetch, got {other:?}"),
    }
}

fn deliver(controller: &mut PageCarouselController, source: &str, book: Book) -> Vec<Effect> {
    controller
        .handle(CarouselEvent::FetchSucceeded {
            source: source.to_string(),
            book: Box::new(book),
        })
        .unwrap()
}

/// Loads the sample book and runs the settle step.
fn ready(numbered: usize, context: bool) -> PageCarouselController {
    let mut controller = PageCarouselController::new(context, false, false);
    start(&mut controller, SAMPLE_URL);
    deliver(&mut controller, SAMPLE_URL, sample_book(numbered));
    let generation = controller.generation();
    controller
        .handle(CarouselEvent::Settled { generation })
        .unwrap();
    controller
}

#[test]
fn test_load_effects_in_order() {
    let mut controller = PageCarouselController::new(false, false, false);
    let location = start(&mut controller, SAMPLE_URL);
    assert_eq!(location.markup_url, "https://host/Sample/Sample.htm");
    assert_eq!(controller.state(), &LoadState::Loading);

    let effects = deliver(&mut controller, SAMPLE_URL, sample_book(2));
    assert_eq!(effects.len(), 4);
    assert_eq!(effects[0], Effect::BookLoaded);
    assert!(matches!(effects[1], Effect::ReportBookProperties(_)));
    assert!(matches!(&effects[2], Effect::ProvideLanguages(l) if l.len() == 2));
    assert_eq!(
        effects[3],
        Effect::ScheduleSettle {
            generation: 1,
            delay: SETTLE_DELAY
        }
    );
    assert!(controller.slides_finalized());
    assert_eq!(controller.slides().len(), 4);
}

#[test]
fn test_navigation_waits_for_settle() {
    let mut controller = PageCarouselController::new(false, false, false);
    start(&mut controller, SAMPLE_URL);
    deliver(&mut controller, SAMPLE_URL, sample_book(2));

    assert!(controller.handle(CarouselEvent::Next).unwrap().is_empty());
    assert_eq!(controller.current_slide(), 0);

    let effects = controller
        .handle(CarouselEvent::Settled { generation: 1 })
        .unwrap();
    assert_eq!(
        effects,
        vec![Effect::PageShown {
            generation: 1,
            page: 0
        }]
    );
    // A second settle for the same load does nothing.
    assert!(controller
        .handle(CarouselEvent::Settled { generation: 1 })
        .unwrap()
        .is_empty());
}

#[test]
fn test_superseded_fetch_is_ignored() {
    let mut controller = PageCarouselController::new(false, false, false);
    start(&mut controller, SAMPLE_URL);
    start(&mut controller, "https://host/Other");
    assert_eq!(controller.generation(), 2);

    assert!(deliver(&mut controller, SAMPLE_URL, sample_book(1)).is_empty());
    assert!(controller.book().is_none());
    assert_eq!(controller.state(), &LoadState::Loading);

    let effects = controller
        .handle(CarouselEvent::FetchFailed {
            source: SAMPLE_URL.to_string(),
            error: LoadError::NotFound {
                url: "https://host/Sample/Sample.htm".to_string(),
            },
        })
        .unwrap();
    assert!(effects.is_empty());
    assert_eq!(controller.state(), &LoadState::Loading);

    // Settles from the old load are stale too.
    assert!(controller
        .handle(CarouselEvent::Settled { generation: 1 })
        .unwrap()
        .is_empty());
}

#[test]
fn test_same_source_is_not_refetched() {
    let mut controller = ready(2, false);
    let effects = controller
        .handle(CarouselEvent::SourceChanged(SAMPLE_URL.to_string()))
        .unwrap();
    assert!(effects.is_empty());
    assert_eq!(controller.state(), &LoadState::Ready);
    assert_eq!(controller.generation(), 1);
}

#[test]
fn test_invalid_source_is_an_error() {
    let mut controller = PageCarouselController::new(false, false, false);
    let result = controller.handle(CarouselEvent::SourceChanged(String::new()));
    assert!(matches!(result, Err(LoadError::Configuration)));
    assert_eq!(controller.generation(), 0);
}

#[test]
fn test_failure_message_replaces_slides() {
    let mut controller = PageCarouselController::new(false, false, false);
    start(&mut controller, "https://host/Gone");
    let effects = controller
        .handle(CarouselEvent::FetchFailed {
            source: "https://host/Gone".to_string(),
            error: LoadError::NotFound {
                url: "https://host/Gone/Gone.htm".to_string(),
            },
        })
        .unwrap();
    match effects.as_slice() {
        [Effect::ShowError(html)] => assert!(html.contains("was not found")),
        other => panic!("expected an error, got {other:?}"),
    }
    assert!(controller.slides().is_empty());
    assert!(controller.handle(CarouselEvent::Next).unwrap().is_empty());
}

#[test]
fn test_context_slides_and_clamping() {
    let mut controller = ready(2, true);
    assert_eq!(
        controller.slides(),
        &[
            Slide::Context,
            Slide::Page(0),
            Slide::Page(1),
            Slide::Page(2),
            Slide::Page(3),
            Slide::Context
        ]
    );
    assert_eq!(controller.current_slide(), 1);

    let effects = controller.handle(CarouselEvent::GoTo { page: 3 }).unwrap();
    assert_eq!(
        effects,
        vec![Effect::PageShown {
            generation: 1,
            page: 3
        }]
    );
    assert!(controller.handle(CarouselEvent::Next).unwrap().is_empty());
    assert_eq!(controller.current_page_index(), Some(3));
}

#[test]
fn test_language_change_only_regenerates_slides() {
    let mut controller = ready(1, false);
    let effects = controller
        .handle(CarouselEvent::LanguageChanged("fr".to_string()))
        .unwrap();
    assert_eq!(effects, vec![Effect::SlidesChanged]);
    assert_eq!(
        controller.book().unwrap().active_language.as_deref(),
        Some("fr")
    );

    // Unknown and unchanged languages do nothing.
    for code in ["xx", "fr"] {
        assert!(controller
            .handle(CarouselEvent::LanguageChanged(code.to_string()))
            .unwrap()
            .is_empty());
    }
}

#[test]
fn test_orientation_change_keeps_position() {
    let mut controller = ready(3, false);
    controller.handle(CarouselEvent::GoTo { page: 2 }).unwrap();

    let effects = controller
        .handle(CarouselEvent::OrientationChanged { landscape: true })
        .unwrap();
    assert_eq!(effects, vec![Effect::SlidesChanged]);
    assert!(controller.landscape());
    assert_eq!(controller.current_page_index(), Some(2));
    assert!(controller.book().unwrap().is_landscape());
}

#[test]
fn test_normalize_page_fixes_drifted_size() {
    let mut controller = ready(1, false);
    controller
        .handle(CarouselEvent::OriginalPageSizeChanged { use_original: true })
        .unwrap();
    let before = controller.book().unwrap().pages[1].markup.clone();
    assert!(before.contains("A5Portrait"));

    // Calling it again with nothing changed leaves the page alone.
    controller.normalize_page(1);
    assert_eq!(controller.book().unwrap().pages[1].markup, before);
    controller.normalize_page(99);
}
