//! Paths of sound files stored on the card.

use heapless::String;

pub const MAX_PATH_LEN: usize = 64;

pub type Path = String<MAX_PATH_LEN>;

/// Make the path absolute by prepending `/` when it is missing.
///
/// Returns `None` for empty paths and those that do not fit.
#[must_use]
pub fn normalize(path: &str) -> Option<Path> {
    if path.is_empty() {
        return None;
    }

    let mut normalized = Path::new();
    if !path.starts_with('/') {
        normalized.push('/').ok()?;
    }
    normalized.push_str(path).ok()?;
    Some(normalized)
}
