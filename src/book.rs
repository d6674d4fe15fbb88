use log::debug;

use crate::language::{select_new_language_code, NationalLanguages};
use crate::metadata::BookMetadata;
use crate::page::Page;
use crate::rewrite::{
    apply_language_visibility, apply_size_class, choose_size_class, mutate_page, BookStyles,
    SizeRequest,
};
use crate::source::BookLocation;

/// A loaded and rewritten book.
#[derive(Debug, Clone)]
pub struct Book {
    pub location: BookLocation,
    pub pages: Vec<Page>,
    pub styles: BookStyles,
    pub body_classes: Vec<String>,
    pub metadata: BookMetadata,
    pub active_language: Option<String>,
}

impl Book {
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Index of the last numbered page, if the book has any.
    pub fn last_numbered_page(&self) -> Option<usize> {
        self.pages
            .iter()
            .rev()
            .find(|p| p.flags.is_numbered && !p.flags.is_xmatter)
            .map(|p| p.index)
    }

    pub fn size_request(&self, landscape: bool, use_original_page_size: bool) -> SizeRequest {
        SizeRequest {
            can_rotate: self.metadata.can_rotate,
            landscape,
            use_original_page_size,
        }
    }

    /// Re-derives every page's size class in place. Returns whether the book
    /// is shown landscape.
    pub fn apply_size_request(&mut self, request: SizeRequest) -> bool {
        let mut landscape = request.landscape && request.can_rotate;
        for page in &mut self.pages {
            let (size, page_landscape) = choose_size_class(page.original_size.as_ref(), request);
            if page.index == 0 {
                landscape = page_landscape;
            }
            if size != page.size {
                mutate_page(page, |node| apply_size_class(node, &size));
                page.size = size;
            }
        }
        landscape
    }

    /// Marks `code` selected and re-applies visibility to every page. Page
    /// flags are left as they were computed at load time.
    pub fn select_language(&mut self, code: &str) -> bool {
        if !select_new_language_code(&mut self.metadata.languages, code)
            && self.metadata.l1.as_deref() != Some(code)
        {
            return false;
        }
        debug!("Showing book in '{code}'");
        let national = NationalLanguages {
            l2: self.metadata.l2.as_deref(),
            l3: self.metadata.l3.as_deref(),
        };
        if self.active_language.as_deref() != Some(code) {
            for page in &mut self.pages {
                mutate_page(page, |node| apply_language_visibility(node, code, national));
            }
        }
        self.active_language = Some(code.to_string());
        true
    }

    /// Whether the first page is shown landscape.
    pub fn is_landscape(&self) -> bool {
        self.pages.first().is_some_and(Page::is_landscape)
    }
}
