use log::{debug, warn};
use markup5ever_rcdom::Handle;

use crate::dom;
use crate::fetch::ResourceLoader;
use crate::rewrite::resources::absolutize_css_urls;
use crate::source::BookLocation;

/// Stylesheets of a book, ready to install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookStyles {
    /// Embedded `<style>` blocks followed by linked sheets, in document order.
    pub combined: String,
    /// `fonts.css`, kept apart because `@font-face` rules don't work inside
    /// a scoped style block. Its urls are already absolute.
    pub fonts: Option<String>,
}

enum StyleSource {
    Embedded(String),
    Linked(String),
}

fn is_font_sheet(url: &str) -> bool {
    url.ends_with("/fonts.css") || url == "fonts.css"
}

/// Collects the book's stylesheets. Linked sheets that fail to load are
/// logged and left out.
pub fn assemble_styles(
    document: &Handle,
    location: &BookLocation,
    loader: &dyn ResourceLoader,
) -> BookStyles {
    let mut embedded = Vec::new();
    let mut linked = Vec::new();
    for source in style_sources(document) {
        match source {
            StyleSource::Embedded(css) => embedded.push(css),
            StyleSource::Linked(href) => linked.push(location.resolve(&href)),
        }
    }

    let fetched: Vec<(String, Option<String>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = linked
            .iter()
            .map(|url| scope.spawn(move || loader.load_text(url)))
            .collect();
        linked
            .iter()
            .zip(handles)
            .map(|(url, handle)| {
                let css = match handle.join() {
                    Ok(Ok(css)) => Some(css),
                    Ok(Err(e)) => {
                        warn!("Skipping stylesheet {url}: {e}");
                        None
                    }
                    Err(_) => {
                        warn!("Skipping stylesheet {url}: loader panicked");
                        None
                    }
                };
                (url.clone(), css)
            })
            .collect()
    });

    let mut styles = BookStyles::default();
    let mut parts = embedded;
    for (url, css) in fetched {
        let Some(css) = css else { continue };
        if is_font_sheet(&url) {
            debug!("Loading font stylesheet {url} separately");
            styles.fonts = Some(absolutize_css_urls(&css, &location.prefix));
        } else {
            parts.push(css);
        }
    }
    styles.combined = parts.join("\n");
    styles
}

fn style_sources(document: &Handle) -> Vec<StyleSource> {
    dom::descendants(document)
        .into_iter()
        .filter_map(|node| match dom::tag_name(&node) {
            Some("style") => Some(StyleSource::Embedded(dom::text_content(&node))),
            Some("link") => {
                let rel = dom::get_attr(&node, "rel").unwrap_or_default();
                if !rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")) {
                    return None;
                }
                dom::get_attr(&node, "href")
                    .filter(|href| !href.trim().is_empty())
                    .map(StyleSource::Linked)
            }
            _ => None,
        })
        .collect()
}
