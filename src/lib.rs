// Export modules for use in tests
pub mod book;
pub mod carousel;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod host;
pub mod language;
pub mod media;
pub mod metadata;
pub mod page;
pub mod player;
pub mod rewrite;
pub mod scheduler;
pub mod source;
pub mod tracker;

pub mod test_utils;

// Re-export main player components
pub use carousel::{LoadState, PageCarouselController, RenderedSlide};
pub use config::PlayerConfig;
pub use error::{FetchError, LoadError};
pub use player::BookPlayer;
