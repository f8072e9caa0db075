//! Target filenames: fallback titles, sanitization, collision handling.

mod compose;
mod fallback;

pub use compose::{sanitize_component, ComposeError, FilenameComposer, MAX_VENUE_CHARS};
pub use fallback::{extract_fallback, heading_from_text, title_from_filename};
