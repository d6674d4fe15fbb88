use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::error::{FetchError, LoadError};
use crate::metadata::MetaJson;
use crate::source::{encode_hash, BookLocation};

/// Source of book resources. Implemented over HTTP/files for real use and
/// in memory for tests.
pub trait ResourceLoader: Sync {
    fn load_text(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: ResourceLoader + Send + ?Sized> ResourceLoader for std::sync::Arc<T> {
    fn load_text(&self, url: &str) -> Result<String, FetchError> {
        (**self).load_text(url)
    }
}

/// Loads `http(s)` urls with ureq and everything else from the file system.
pub struct HttpLoader {
    agent: ureq::Agent,
}

impl HttpLoader {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    fn load_http(&self, url: &str) -> Result<String, FetchError> {
        match self.agent.get(url).call() {
            Ok(response) => response.into_string().map_err(|e| FetchError::Transport {
                url: url.to_string(),
                detail: format!("failed to read body: {e}"),
            }),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                url: url.to_string(),
                detail: transport.to_string(),
            }),
        }
    }

    fn load_file(&self, url: &str) -> Result<String, FetchError> {
        let path = local_path(url).ok_or_else(|| FetchError::LocalFile {
            url: url.to_string(),
            detail: "malformed file path".to_string(),
        })?;
        std::fs::read_to_string(&path).map_err(|e| FetchError::LocalFile {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ResourceLoader for HttpLoader {
    fn load_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {url}");
        if url.starts_with("http://") || url.starts_with("https://") {
            self.load_http(url)
        } else {
            self.load_file(url)
        }
    }
}

/// Maps `file://` urls and bare paths to a local path. Percent escapes are
/// decoded; a bad escape makes the path malformed.
fn local_path(url: &str) -> Option<PathBuf> {
    let raw = url.strip_prefix("file://").unwrap_or(url);
    let decoded = percent_decode(raw)?;
    if decoded.is_empty() {
        return None;
    }
    Some(PathBuf::from(decoded))
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Raw text of a book, before any rewriting.
#[derive(Debug, Clone)]
pub struct FetchedBook {
    pub location: BookLocation,
    pub markup: String,
    pub meta: MetaJson,
}

/// Fetches the markup and `meta.json` at the same time; both must succeed.
pub fn fetch_book(
    loader: &dyn ResourceLoader,
    location: &BookLocation,
) -> Result<FetchedBook, LoadError> {
    let markup_url = encode_hash(&location.markup_url);
    let meta_url = location.meta_url();
    info!("Loading book from {markup_url}");

    let (markup, meta) = std::thread::scope(|scope| {
        let meta_handle = scope.spawn(|| loader.load_text(&meta_url));
        let markup = loader.load_text(&markup_url);
        let meta = meta_handle.join().unwrap_or_else(|_| {
            Err(FetchError::Transport {
                url: meta_url.clone(),
                detail: "metadata fetch panicked".to_string(),
            })
        });
        (markup, meta)
    });

    let markup = markup?;
    let meta = MetaJson::parse(&meta?)?;
    debug!("Fetched {} bytes of markup", markup.len());

    Ok(FetchedBook {
        location: location.clone(),
        markup,
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_local_path_decoding() {
        assert_eq!(
            local_path("file:///tmp/My%20Book/a.htm"),
            Some(PathBuf::from("/tmp/My Book/a.htm"))
        );
        assert_eq!(local_path("file:///tmp/bad%zz"), None);
    }

    #[test]
    fn test_file_loading_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{{}}").unwrap();

        let loader = HttpLoader::default();
        let url = format!("file://{}", path.display());
        assert_eq!(loader.load_text(&url).unwrap(), "{}");

        let missing = format!("file://{}", dir.path().join("nope.htm").display());
        let err = loader.load_text(&missing).unwrap_err();
        assert!(err.is_not_found());
    }
}
