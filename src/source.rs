use crate::error::LoadError;

/// Value hosts pass while the book is still being prepared.
pub const PREPARING_SENTINEL: &str = "working";

/// A book location resolved from the raw `url` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUrl {
    /// The host is still preparing the book; keep showing the spinner.
    Preparing,
    Book(BookLocation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLocation {
    /// The raw parameter as given, used to detect superseded loads.
    pub raw: String,
    /// Full url of the book's markup file.
    pub markup_url: String,
    /// Folder every other per-book resource is resolved against. No trailing slash.
    pub prefix: String,
}

impl SourceUrl {
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LoadError::Configuration);
        }
        if trimmed == PREPARING_SENTINEL {
            return Ok(Self::Preparing);
        }

        let url = strip_trailing_slash(trimmed);
        let lower = url.to_ascii_lowercase();
        let markup_url = if lower.ends_with(".htm") || lower.ends_with(".html") {
            url.to_string()
        } else {
            let folder_name = url.rsplit(['/', '\\']).next().unwrap_or(url);
            format!("{url}/{folder_name}.htm")
        };
        let prefix = match markup_url.rfind('/') {
            Some(pos) => markup_url[..pos].to_string(),
            None => String::new(),
        };

        Ok(Self::Book(BookLocation {
            raw: raw.to_string(),
            markup_url,
            prefix,
        }))
    }
}

impl BookLocation {
    pub fn meta_url(&self) -> String {
        self.resolve("meta.json")
    }

    /// Resolves a reference found inside the book. Absolute references are
    /// returned as is apart from `#` encoding.
    pub fn resolve(&self, reference: &str) -> String {
        resolve_against(&self.prefix, reference)
    }
}

fn strip_trailing_slash(url: &str) -> &str {
    if let Some(stripped) = url.strip_suffix('/') {
        return stripped;
    }
    let len = url.len();
    if len >= 3 && url.is_char_boundary(len - 3) && url[len - 3..].eq_ignore_ascii_case("%2f") {
        return &url[..len - 3];
    }
    url
}

/// True for `scheme:...` and protocol-relative `//host/...` references.
pub fn is_absolute(reference: &str) -> bool {
    if reference.starts_with("//") {
        return true;
    }
    match reference.find(':') {
        Some(pos) if pos > 1 => reference[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

pub fn resolve_against(prefix: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.starts_with("data:") {
        return reference.to_string();
    }
    if is_absolute(reference) {
        return encode_hash(reference);
    }
    // Books are self-contained folders, so `/img/a.png` still means a file
    // inside the book.
    let relative = reference.strip_prefix("./").unwrap_or(reference);
    let relative = relative.trim_start_matches('/');
    if prefix.is_empty() {
        encode_hash(relative)
    } else {
        encode_hash(&format!("{prefix}/{relative}"))
    }
}

/// Some hosts treat a literal `#` in a file name as a fragment marker.
pub fn encode_hash(url: &str) -> String {
    url.replace('#', "%23")
}
