/// Failure of a single resource request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("could not read {url}: {detail}")]
    LocalFile { url: String, detail: String },

    #[error("{detail}")]
    Transport { url: String, detail: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::LocalFile { url, .. } | Self::Transport { url, .. } => {
                url
            }
        }
    }

    /// 404s and any local-file failure mean the book is simply not there.
    /// Network errors can't happen for local files.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Status { status: 404, .. } | Self::LocalFile { .. }
        )
    }
}

/// Errors that stop a book from loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("no book url was provided")]
    Configuration,

    #[error("the book at {url} was not found")]
    NotFound { url: String },

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("failed to process book: {0}")]
    Transform(String),
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                url: err.url().to_string(),
            }
        } else {
            Self::Fetch {
                url: err.url().to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl LoadError {
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Markup shown in place of the book when loading failed.
    pub fn user_message_html(&self) -> String {
        match self {
            Self::NotFound { url } => format!(
                "<p>The book at <code>{}</code> was not found.</p>",
                escape_html(url)
            ),
            other => format!(
                "<p>There was a problem loading this book:</p><p>{}</p>",
                escape_html(&other.to_string())
            ),
        }
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_becomes_not_found() {
        let err: LoadError = FetchError::Status {
            url: "https://host/Book/Book.htm".to_string(),
            status: 404,
        }
        .into();
        let html = err.user_message_html();
        assert!(html.contains("was not found"));
        assert!(html.contains("https://host/Book/Book.htm"));
    }

    #[test]
    fn test_local_file_failure_is_not_found() {
        let err: LoadError = FetchError::LocalFile {
            url: "file:///tmp/none.htm".to_string(),
            detail: "No such file".to_string(),
        }
        .into();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_other_errors_include_detail() {
        let err: LoadError = FetchError::Transport {
            url: "https://host/a.htm".to_string(),
            detail: "connection reset <boom>".to_string(),
        }
        .into();
        let html = err.user_message_html();
        assert!(html.contains("problem loading"));
        assert!(html.contains("connection reset &lt;boom&gt;"));
    }
}
