use std::iter::repeat;
use std::path::{Path, PathBuf};

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

/// Returns `true` if the field value carries any content.
///
/// Form inputs arrive as strings and an untouched input is an empty string, so
/// emptiness is the only notion of "missing".
#[inline]
pub fn is_filled(value: impl AsRef<str>) -> bool {
    !value.as_ref().is_empty()
}
