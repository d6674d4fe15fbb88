use markup5ever_rcdom::Handle;

use crate::dom;
use crate::language::{
    decide_visibility, parse_default_languages, EditableLanguage, NationalLanguages,
};

pub const TRANSLATION_GROUP_CLASS: &str = "bloom-translationGroup";
pub const EDITABLE_CLASS: &str = "bloom-editable";
pub const VISIBLE_CLASS: &str = "bloom-visibility-code-on";
pub const PRIMARY_CLASS: &str = "bloom-content1";

/// Shows the editables of every translation group under `root` that belong
/// to `active`, and hides the rest. Running it twice gives the same classes.
pub fn apply_language_visibility(root: &Handle, active: &str, national: NationalLanguages<'_>) {
    let groups = dom::find_all(root, |n| dom::has_class(n, TRANSLATION_GROUP_CLASS));
    for group in groups {
        let value = dom::get_attr(&group, "data-default-languages");
        let defaults = parse_default_languages(value.as_deref());
        for editable in dom::element_children(&group) {
            if !dom::has_class(&editable, EDITABLE_CLASS) {
                continue;
            }
            let Some(lang) = dom::get_attr(&editable, "lang") else {
                continue;
            };
            let facts = EditableLanguage {
                lang: &lang,
                secondary_content: dom::has_class(&editable, "bloom-content2")
                    || dom::has_class(&editable, "bloom-content3"),
            };
            let visibility = decide_visibility(&defaults, facts, active, national);

            dom::remove_class(&editable, VISIBLE_CLASS);
            dom::remove_class(&editable, PRIMARY_CLASS);
            if visibility.visible {
                dom::add_class(&editable, VISIBLE_CLASS);
            }
            if visibility.primary {
                dom::add_class(&editable, PRIMARY_CLASS);
            }
        }
    }
}
