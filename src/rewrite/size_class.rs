use markup5ever_rcdom::Handle;

use crate::dom;
use crate::page::{Orientation, PageSizeClass};

/// Inputs that decide which size class a page is shown with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeRequest {
    pub can_rotate: bool,
    pub landscape: bool,
    pub use_original_page_size: bool,
}

/// Picks the class a page should carry. Returns it with whether the result
/// is landscape.
///
/// Pages without a recognizable size class are treated as device portrait.
pub fn choose_size_class(
    original: Option<&PageSizeClass>,
    request: SizeRequest,
) -> (PageSizeClass, bool) {
    let original = original
        .cloned()
        .unwrap_or_else(|| PageSizeClass::device(Orientation::Portrait));

    if request.use_original_page_size {
        let landscape = original.is_landscape();
        return (original, landscape);
    }

    let landscape = if request.can_rotate {
        request.landscape
    } else {
        original.is_landscape()
    };
    let orientation = if landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    (PageSizeClass::device(orientation), landscape)
}

/// Replaces whatever size class `page` carries with `class`.
pub fn apply_size_class(page: &Handle, class: &PageSizeClass) {
    for existing in dom::classes(page) {
        if PageSizeClass::parse(&existing).is_some() {
            dom::remove_class(page, &existing);
        }
    }
    dom::add_class(page, &class.class_name());
}
