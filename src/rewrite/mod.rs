//! Turns fetched book markup into pages that can be embedded safely.

pub mod resources;
pub mod size_class;
pub mod styles;
pub mod visibility;

use log::{debug, info, warn};
use markup5ever_rcdom::Handle;

use crate::book::Book;
use crate::dom;
use crate::error::LoadError;
use crate::fetch::{FetchedBook, ResourceLoader};
use crate::language::{select_new_language_code, NationalLanguages};
use crate::metadata::{BookMetadata, MarkupFacts};
use crate::page::{Page, PageFlags, PageSizeClass};

pub use resources::{absolutize_css_urls, rewrite_resource_urls, LAZY_CLASS};
pub use size_class::{apply_size_class, choose_size_class, SizeRequest};
pub use styles::{assemble_styles, BookStyles};
pub use visibility::apply_language_visibility;

/// Class that marks an element as one book page.
pub const PAGE_CLASS: &str = "bloom-page";

/// What the viewer currently asks for; affects size classes and visibility.
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    pub landscape: bool,
    pub use_original_page_size: bool,
    /// Requested language; falls back to the book's first language when the
    /// book doesn't have it.
    pub active_language: Option<String>,
}

/// Parses and rewrites a freshly fetched book.
pub fn rewrite_book(
    fetched: &FetchedBook,
    options: &RewriteOptions,
    loader: &dyn ResourceLoader,
) -> Result<Book, LoadError> {
    let dom = dom::parse_html(&fetched.markup);
    let document = &dom.document;
    let body = dom::find_first(document, |n| dom::tag_name(n) == Some("body"))
        .ok_or_else(|| LoadError::transform("book markup has no body"))?;

    // The preview is never editable.
    for node in dom::descendants(document) {
        dom::remove_attr(&node, "contenteditable");
    }

    let mut facts = scan_markup_facts(document, &body);
    let page_nodes = dom::find_all(&body, |n| dom::has_class(n, PAGE_CLASS));
    info!("Book has {} pages", page_nodes.len());

    let request = SizeRequest {
        can_rotate: facts.can_rotate,
        landscape: options.landscape,
        use_original_page_size: options.use_original_page_size,
    };
    let prefix = &fetched.location.prefix;

    let mut pages = Vec::with_capacity(page_nodes.len());
    for (index, node) in page_nodes.iter().enumerate() {
        dom::set_attr(node, "data-page-index", &index.to_string());
        let page_classes = dom::classes(node);
        let original_size = PageSizeClass::from_classes(page_classes.iter().map(String::as_str));
        let (size, _) = choose_size_class(original_size.as_ref(), request);
        apply_size_class(node, &size);
        rewrite_resource_urls(node, prefix);

        pages.push(Page {
            index,
            markup: String::new(),
            original_size,
            size,
            flags: page_flags(node),
            page_number: dom::get_attr(node, "data-page-number").filter(|n| !n.is_empty()),
        });
    }

    facts.numbered_page_count = pages.iter().filter(|p| p.flags.is_numbered).count();
    facts.question_page_count = pages.iter().filter(|p| p.flags.is_question_page).count();
    let mut metadata = BookMetadata::build(facts, &fetched.meta);

    let active = resolve_active_language(&metadata, options.active_language.as_deref());
    let national = NationalLanguages {
        l2: metadata.l2.as_deref(),
        l3: metadata.l3.as_deref(),
    };
    for (page, node) in pages.iter_mut().zip(&page_nodes) {
        if let Some(active) = &active {
            apply_language_visibility(node, active, national);
        }
        page.markup = dom::outer_html(node);
    }

    let styles = assemble_styles(document, &fetched.location, loader);
    debug!(
        "Assembled {} bytes of page styles (fonts: {})",
        styles.combined.len(),
        styles.fonts.is_some()
    );

    if let Some(active) = &active {
        select_new_language_code(&mut metadata.languages, active);
    }

    Ok(Book {
        location: fetched.location.clone(),
        pages,
        styles,
        body_classes: dom::classes(&body),
        metadata,
        active_language: active,
    })
}

fn resolve_active_language(metadata: &BookMetadata, requested: Option<&str>) -> Option<String> {
    if let Some(requested) = requested {
        if metadata.languages.iter().any(|l| l.code == requested) {
            return Some(requested.to_string());
        }
        warn!("Book has no language '{requested}', using its default");
    }
    metadata
        .languages
        .first()
        .map(|l| l.code.clone())
        .or_else(|| metadata.l1.clone())
}

fn scan_markup_facts(document: &Handle, body: &Handle) -> MarkupFacts {
    let can_rotate = dom::get_attr(body, "data-bfcanrotate")
        .map(|v| v.contains("allOrientations"))
        .unwrap_or(false);

    let data_div = dom::find_first(document, |n| {
        dom::get_attr(n, "id").as_deref() == Some("bloomDataDiv")
    });
    let content_language = |n: u8| {
        let key = format!("contentLanguage{n}");
        let div = data_div.as_ref()?;
        let entry = dom::find_first(div, |e| {
            dom::get_attr(e, "data-book").as_deref() == Some(key.as_str())
        })?;
        let code = dom::text_content(&entry).trim().to_string();
        (!code.is_empty()).then_some(code)
    };

    MarkupFacts {
        can_rotate,
        l1: content_language(1),
        l2: content_language(2),
        l3: content_language(3),
        ..Default::default()
    }
}

fn page_flags(page: &Handle) -> PageFlags {
    let nodes = dom::descendants(page);
    let non_empty = |name: &str| {
        dom::get_attr(page, name).is_some_and(|value| !value.trim().is_empty())
    };

    PageFlags {
        is_numbered: non_empty("data-page-number"),
        is_xmatter: dom::has_attr(page, "data-xmatter-page"),
        is_question_page: dom::has_class(page, "questions")
            || dom::get_attr(page, "data-activity").as_deref()
                == Some("simple-comprehension-quiz"),
        has_audio: nodes.iter().any(|n| {
            dom::has_class(n, "audio-sentence") || dom::has_attr(n, "data-audiorecordingmode")
        }),
        has_music: non_empty("data-backgroundaudio"),
        has_video: nodes.iter().any(|n| dom::tag_name(n) == Some("video")),
        has_animation: nodes.iter().any(|n| dom::has_attr(n, "data-initialrect")),
    }
}

/// Re-parses a stored page, lets `f` mutate it and stores the result.
pub fn mutate_page(page: &mut Page, f: impl FnOnce(&Handle)) {
    match dom::parse_single_element(&page.markup) {
        Some(node) => {
            f(&node);
            page.markup = dom::outer_html(&node);
        }
        None => warn!("Page {} has no element to update", page.index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_flags() {
        let page = dom::parse_single_element(
            r#"<div class="bloom-page" data-page-number="3" data-backgroundaudio="song.mp3"><span class="audio-sentence">Hi</span><div data-initialrect="0 0 1 1"></div></div>"#,
        )
        .unwrap();
        let flags = page_flags(&page);
        assert!(flags.is_numbered);
        assert!(flags.has_audio);
        assert!(flags.has_music);
        assert!(flags.has_animation);
        assert!(!flags.has_video);
        assert!(!flags.is_xmatter);
    }

    #[test]
    fn test_xmatter_and_quiz_pages() {
        let cover = dom::parse_single_element(
            r#"<div class="bloom-page" data-xmatter-page="frontCover" data-page-number=""></div>"#,
        )
        .unwrap();
        let flags = page_flags(&cover);
        assert!(flags.is_xmatter);
        assert!(!flags.is_numbered);

        let quiz = dom::parse_single_element(
            r#"<div class="bloom-page" data-activity="simple-comprehension-quiz"></div>"#,
        )
        .unwrap();
        assert!(page_flags(&quiz).is_question_page);
    }

    #[test]
    fn test_mutate_page_updates_markup() {
        let mut page = Page {
            index: 0,
            markup: r#"<div class="bloom-page"><p>Hi <img src="a.png"></p></div>"#.to_string(),
            original_size: None,
            size: PageSizeClass::device(crate::page::Orientation::Portrait),
            flags: PageFlags::default(),
            page_number: None,
        };
        mutate_page(&mut page, |node| dom::add_class(node, "x"));
        assert_eq!(
            page.markup,
            r#"<div class="bloom-page x"><p>Hi <img src="a.png"></p></div>"#
        );
        mutate_page(&mut page, |node| dom::remove_class(node, "x"));
        assert_eq!(
            page.markup,
            r#"<div class="bloom-page"><p>Hi <img src="a.png"></p></div>"#
        );
    }
}
