//! Profile file selection
//!
//! Applies a [`FileNamePattern`] to the candidate URLs of a listing. The
//! relative order of the candidates is kept because it becomes the merge
//! order of the final dataset.

use url::Url;

use crate::app::pattern::FileNamePattern;

/// Keep the candidates whose file name matches `pattern`, in input order
pub fn select_files<'a, I>(pattern: &FileNamePattern, candidates: I) -> Vec<Url>
where
    I: IntoIterator<Item = &'a Url>,
{
    let selected: Vec<Url> = candidates
        .into_iter()
        .filter(|url| pattern.matches(url))
        .cloned()
        .collect();
    tracing::debug!(
        "Selected {} files with pattern {}",
        selected.len(),
        pattern.as_str()
    );
    selected
}
