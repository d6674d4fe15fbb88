use serde::Serialize;

/// Device size classes pages are normalized to.
pub const DEVICE_PORTRAIT: &str = "Device16x9Portrait";
pub const DEVICE_LANDSCAPE: &str = "Device16x9Landscape";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// A page's size/orientation class, e.g. `A5Portrait` or `Device16x9Landscape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizeClass {
    /// Size part of the class (`A5`, `Device16x9`, ...).
    pub size: String,
    pub orientation: Orientation,
}

impl PageSizeClass {
    pub fn parse(class: &str) -> Option<Self> {
        let (size, orientation) = if let Some(size) = class.strip_suffix("Portrait") {
            (size, Orientation::Portrait)
        } else if let Some(size) = class.strip_suffix("Landscape") {
            (size, Orientation::Landscape)
        } else {
            return None;
        };
        if size.is_empty() || !size.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self {
            size: size.to_string(),
            orientation,
        })
    }

    pub fn device(orientation: Orientation) -> Self {
        Self {
            size: "Device16x9".to_string(),
            orientation,
        }
    }

    /// Finds the size class among a page's classes.
    pub fn from_classes<'a>(mut classes: impl Iterator<Item = &'a str>) -> Option<Self> {
        classes.find_map(Self::parse)
    }

    pub fn is_landscape(&self) -> bool {
        self.orientation == Orientation::Landscape
    }

    pub fn class_name(&self) -> String {
        match self.orientation {
            Orientation::Portrait => format!("{}Portrait", self.size),
            Orientation::Landscape => format!("{}Landscape", self.size),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFlags {
    pub is_numbered: bool,
    pub is_xmatter: bool,
    pub is_question_page: bool,
    pub has_audio: bool,
    pub has_music: bool,
    pub has_video: bool,
    pub has_animation: bool,
}

/// One book page: its markup plus what we learned about it while rewriting.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    /// Outer HTML of the page element.
    pub markup: String,
    /// Class the page carried in the book file, before normalization.
    pub original_size: Option<PageSizeClass>,
    pub size: PageSizeClass,
    pub flags: PageFlags,
    /// `data-page-number`, when the page has one.
    pub page_number: Option<String>,
}

impl Page {
    pub fn is_landscape(&self) -> bool {
        self.size.is_landscape()
    }
}
