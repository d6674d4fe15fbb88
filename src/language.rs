use serde::Serialize;

/// One language the book can be shown in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LangData {
    pub code: String,
    pub name: String,
    pub selected: bool,
}

impl LangData {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            selected: false,
        }
    }
}

/// Builds the language list from `(code, display name)` pairs, putting the
/// book's primary language first and selecting it.
pub fn create_lang_data(names: &[(String, String)], primary: Option<&str>) -> Vec<LangData> {
    let mut languages: Vec<LangData> = names
        .iter()
        .map(|(code, name)| {
            let name = if name.trim().is_empty() { code } else { name };
            LangData::new(code.clone(), name.clone())
        })
        .collect();

    if let Some(primary) = primary {
        if let Some(pos) = languages.iter().position(|l| l.code == primary) {
            let lang = languages.remove(pos);
            languages.insert(0, lang);
        }
    }
    if let Some(first) = languages.first_mut() {
        first.selected = true;
    }
    languages
}

/// Marks `code` as the only selected language. Returns false, leaving the
/// list untouched, when `code` isn't one of the book's languages.
pub fn select_new_language_code(languages: &mut [LangData], code: &str) -> bool {
    if !languages.iter().any(|l| l.code == code) {
        return false;
    }
    for lang in languages.iter_mut() {
        lang.selected = lang.code == code;
    }
    true
}

pub fn selected_code(languages: &[LangData]) -> Option<&str> {
    languages
        .iter()
        .find(|l| l.selected)
        .map(|l| l.code.as_str())
}

/// One entry of a `data-default-languages` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultLanguage {
    Auto,
    /// `V` or `L1`
    Vernacular,
    /// `N1` or `L2`
    National1,
    /// `N2` or `L3`
    National2,
    Code(String),
}

impl DefaultLanguage {
    fn from_token(token: &str) -> Self {
        match token {
            "auto" => Self::Auto,
            "V" | "L1" => Self::Vernacular,
            "N1" | "L2" => Self::National1,
            "N2" | "L3" => Self::National2,
            other => Self::Code(other.to_string()),
        }
    }
}

/// Parses a comma and/or space separated `data-default-languages` value.
pub fn parse_default_languages(value: Option<&str>) -> Vec<DefaultLanguage> {
    value
        .unwrap_or("")
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(DefaultLanguage::from_token)
        .collect()
}

/// The language facts of one editable element in a translation group.
#[derive(Debug, Clone, Copy)]
pub struct EditableLanguage<'a> {
    pub lang: &'a str,
    /// Carries the `bloom-content2` or `bloom-content3` class.
    pub secondary_content: bool,
}

/// The book's national language codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NationalLanguages<'a> {
    pub l2: Option<&'a str>,
    pub l3: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub visible: bool,
    /// Shown in the active language; gets primary-language styling.
    pub primary: bool,
}

/// Decides whether an editable is shown for the active language.
pub fn decide_visibility(
    defaults: &[DefaultLanguage],
    editable: EditableLanguage<'_>,
    active: &str,
    national: NationalLanguages<'_>,
) -> Visibility {
    let matches_active = editable.lang == active;
    let automatic = defaults.is_empty() || defaults.iter().all(|d| *d == DefaultLanguage::Auto);

    let visible = if automatic {
        matches_active || editable.secondary_content
    } else {
        let has = |wanted: &DefaultLanguage| defaults.iter().any(|d| d == wanted);
        let is_l2 = national.l2 == Some(editable.lang);
        let is_l3 = national.l3 == Some(editable.lang);

        (matches_active && has(&DefaultLanguage::Vernacular))
            || (is_l2 && has(&DefaultLanguage::National1))
            || (is_l3 && has(&DefaultLanguage::National2))
            || defaults
                .iter()
                .any(|d| matches!(d, DefaultLanguage::Code(code) if code == editable.lang))
    };

    Visibility {
        visible,
        primary: visible && matches_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs() -> Vec<LangData> {
        create_lang_data(
            &[
                ("en".to_string(), "English".to_string()),
                ("fr".to_string(), "français".to_string()),
                ("tpi".to_string(), "".to_string()),
            ],
            Some("fr"),
        )
    }

    fn editable(lang: &str) -> EditableLanguage<'_> {
        EditableLanguage {
            lang,
            secondary_content: false,
        }
    }

    #[test]
    fn test_primary_language_comes_first_and_is_selected() {
        let languages = langs();
        assert_eq!(languages[0].code, "fr");
        assert!(languages[0].selected);
        assert_eq!(languages[2].name, "tpi");
    }

    #[test]
    fn test_exactly_one_selected() {
        let mut languages = langs();
        for code in ["en", "tpi", "fr", "en"] {
            assert!(select_new_language_code(&mut languages, code));
            let selected: Vec<_> = languages.iter().filter(|l| l.selected).collect();
            assert_eq!(selected.len(), 1);
            assert_eq!(selected[0].code, code);
        }
    }

    #[test]
    fn test_unknown_selection_is_noop() {
        let mut languages = langs();
        assert!(!select_new_language_code(&mut languages, "de"));
        assert_eq!(selected_code(&languages), Some("fr"));
    }

    #[test]
    fn test_vernacular_default_shows_active_language() {
        let defaults = parse_default_languages(Some("V"));
        let national = NationalLanguages::default();
        let fr = decide_visibility(&defaults, editable("fr"), "fr", national);
        let en = decide_visibility(&defaults, editable("en"), "fr", national);
        assert_eq!(fr, Visibility { visible: true, primary: true });
        assert_eq!(en, Visibility::default());
    }

    #[test]
    fn test_auto_shows_active_and_secondary() {
        let national = NationalLanguages::default();
        for value in [None, Some(""), Some("auto")] {
            let defaults = parse_default_languages(value);
            assert!(decide_visibility(&defaults, editable("en"), "en", national).visible);
            assert!(!decide_visibility(&defaults, editable("de"), "en", national).visible);
            let secondary = EditableLanguage {
                lang: "de",
                secondary_content: true,
            };
            let vis = decide_visibility(&defaults, secondary, "en", national);
            assert!(vis.visible);
            assert!(!vis.primary);
        }
    }

    #[test]
    fn test_national_languages() {
        let national = NationalLanguages {
            l2: Some("en"),
            l3: Some("es"),
        };
        let defaults = parse_default_languages(Some("V, N1"));
        assert!(decide_visibility(&defaults, editable("en"), "tpi", national).visible);
        assert!(!decide_visibility(&defaults, editable("es"), "tpi", national).visible);

        let defaults = parse_default_languages(Some("L3"));
        let es = decide_visibility(&defaults, editable("es"), "tpi", national);
        assert!(es.visible);
        assert!(!es.primary);
    }

    #[test]
    fn test_literal_codes_and_unknown_tokens() {
        let national = NationalLanguages::default();
        let defaults = parse_default_languages(Some("xyz,  de ???"));
        assert!(decide_visibility(&defaults, editable("de"), "en", national).visible);
        assert!(!decide_visibility(&defaults, editable("en"), "en", national).visible);
        assert!(!decide_visibility(&defaults, editable("???x"), "en", national).visible);
    }
}
