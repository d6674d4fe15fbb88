use std::sync::LazyLock;

use log::debug;
use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::dom;
use crate::source::resolve_against;

/// Class the carousel's lazy loader looks for before loading `data-background`.
pub const LAZY_CLASS: &str = "swiper-lazy";

static BACKGROUND_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background-image\s*:\s*url\(\s*['"]?([^'")]*?)['"]?\s*\)\s*;?"#)
        .expect("Failed to compile background-image regex")
});

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(['"]?)([^'")]+)['"]?\s*\)"#).expect("Failed to compile css url regex")
});

/// Makes every direct resource reference under `root` absolute against
/// `prefix`. Inline background images become lazily loaded `data-background`
/// attributes.
pub fn rewrite_resource_urls(root: &Handle, prefix: &str) {
    for node in dom::descendants(root) {
        if let Some(src) = dom::get_attr(&node, "src") {
            if !src.trim().is_empty() {
                dom::set_attr(&node, "src", &resolve_against(prefix, &src));
            }
        }
        if let Some(style) = dom::get_attr(&node, "style") {
            defer_background_image(&node, &style, prefix);
        }
    }
}

fn defer_background_image(node: &Handle, style: &str, prefix: &str) {
    let Some(captures) = BACKGROUND_IMAGE_RE.captures(style) else {
        return;
    };
    let reference = captures.get(1).map_or("", |m| m.as_str()).trim();
    let remaining = BACKGROUND_IMAGE_RE.replace_all(style, "");
    let remaining = remaining.trim();

    if remaining.is_empty() {
        dom::remove_attr(node, "style");
    } else {
        dom::set_attr(node, "style", remaining);
    }
    if reference.is_empty() {
        return;
    }
    let url = resolve_against(prefix, reference);
    debug!("Deferring background image {url}");
    dom::set_attr(node, "data-background", &url);
    dom::add_class(node, LAZY_CLASS);
}

/// Rewrites relative `url(...)` references inside a stylesheet. In CSS a `#`
/// starts a fragment (`font.svg#Name`, `url(#filter)`), so it is kept as is.
pub fn absolutize_css_urls(css: &str, prefix: &str) -> String {
    CSS_URL_RE
        .replace_all(css, |caps: &regex::Captures| {
            let quote = caps.get(1).map_or("", |m| m.as_str());
            let quote = if quote.is_empty() { "\"" } else { quote };
            format!("url({quote}{}{quote})", resolve_css_reference(prefix, &caps[2]))
        })
        .into_owned()
}

fn resolve_css_reference(prefix: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.starts_with('#') {
        return reference.to_string();
    }
    match reference.split_once('#') {
        Some((path, fragment)) => format!("{}#{fragment}", resolve_against(prefix, path)),
        None => resolve_against(prefix, reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://host/Book";

    #[test]
    fn test_src_attributes_become_absolute() {
        let page = dom::parse_single_element(
            r#"<div class="bloom-page"><img src="a.png"><video><source src="v/clip.mp4"></video><audio src="https://cdn/s.mp3"></audio></div>"#,
        )
        .unwrap();
        rewrite_resource_urls(&page, PREFIX);
        let srcs: Vec<_> = dom::descendants(&page)
            .iter()
            .filter_map(|n| dom::get_attr(n, "src"))
            .collect();
        assert_eq!(
            srcs,
            vec![
                "https://host/Book/a.png",
                "https://host/Book/v/clip.mp4",
                "https://cdn/s.mp3"
            ]
        );
    }

    #[test]
    fn test_root_relative_src_is_resolved_in_book() {
        let page = dom::parse_single_element(
            r#"<div class="bloom-page"><img src="/img/a.png"><img src="sub/b.png"></div>"#,
        )
        .unwrap();
        rewrite_resource_urls(&page, PREFIX);
        let srcs: Vec<_> = dom::descendants(&page)
            .iter()
            .filter_map(|n| dom::get_attr(n, "src"))
            .collect();
        assert_eq!(
            srcs,
            vec!["https://host/Book/img/a.png", "https://host/Book/sub/b.png"]
        );
    }

    #[test]
    fn test_background_image_is_deferred() {
        let node = dom::parse_single_element(
            r#"<div style="color: red; background-image:url('my pic.jpg');"></div>"#,
        )
        .unwrap();
        rewrite_resource_urls(&node, PREFIX);
        assert_eq!(
            dom::get_attr(&node, "data-background").as_deref(),
            Some("https://host/Book/my pic.jpg")
        );
        assert!(dom::has_class(&node, LAZY_CLASS));
        assert_eq!(dom::get_attr(&node, "style").as_deref(), Some("color: red;"));
    }

    #[test]
    fn test_background_only_style_is_removed() {
        let node =
            dom::parse_single_element(r#"<div style="background-image: url(x.png)"></div>"#)
                .unwrap();
        rewrite_resource_urls(&node, PREFIX);
        assert!(!dom::has_attr(&node, "style"));
    }

    #[test]
    fn test_css_urls() {
        let css = r#"@font-face { src: url('Andika.woff'); } .x { background: url(https://cdn/a.png) }"#;
        let out = absolutize_css_urls(css, PREFIX);
        assert!(out.contains("url('https://host/Book/Andika.woff')"));
        assert!(out.contains("url(\"https://cdn/a.png\")"));
    }

    #[test]
    fn test_css_fragments_are_not_encoded() {
        let css = r#"@font-face { src: url(Andika.svg#Andika) format("svg"); } .x { filter: url(#f); }"#;
        let out = absolutize_css_urls(css, PREFIX);
        assert!(out.contains(r#"url("https://host/Book/Andika.svg#Andika")"#), "{out}");
        assert!(out.contains(r##"url("#f")"##), "{out}");
        assert!(!out.contains("%23"));
    }
}
