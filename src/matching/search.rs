use thiserror::Error;

use crate::core::entry::CatalogEntry;
use crate::matching::scoring::ratio;

/// Top scores at or below this are too weak to pick a working set from
pub const MIN_SEARCH_SCORE: u8 = 50;

/// Number of names offered when a search is too vague
pub const SUGGESTION_COUNT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search '{query}' is too vague (best score {best_score}%)")]
    TooVague {
        query: String,
        best_score: u8,
        /// Best-ranked entry names, most similar first
        suggestions: Vec<String>,
    },
}

/// A catalog entry selected for a run, with its search confidence
#[derive(Debug, Clone, Copy)]
pub struct ScoredEntry<'a> {
    pub entry: &'a CatalogEntry,

    /// Similarity to the search query (100 when no search is active)
    pub score: u8,
}

/// Every entry, alphabetically by name, all with confidence 100
pub fn all_entries(entries: &[CatalogEntry]) -> Vec<ScoredEntry<'_>> {
    let mut all: Vec<ScoredEntry<'_>> = entries
        .iter()
        .map(|entry| ScoredEntry { entry, score: 100 })
        .collect();
    all.sort_by(|a, b| a.entry.name.cmp(&b.entry.name));
    all
}

/// Select the working set for a search query.
///
/// Names are compared case-insensitively and truncated to the query's length
/// first, so `"seiken"` scores 100 against `"Seiken Densetsu 3"`. Results are
/// ranked by score (ties keep catalog order). If the best score is at most
/// [`MIN_SEARCH_SCORE`] the search fails with suggestions; otherwise every
/// entry scoring above 90% of the best (`score > best - best / 10`) is kept.
///
/// # Errors
///
/// Returns `SearchError::TooVague` when nothing matches well enough,
/// including for an empty catalog.
pub fn search_catalog<'a>(
    entries: &'a [CatalogEntry],
    query: &str,
) -> Result<Vec<ScoredEntry<'a>>, SearchError> {
    let query_upper = query.to_uppercase();
    let query_len = query_upper.chars().count();

    let mut ranked: Vec<ScoredEntry<'a>> = entries
        .iter()
        .map(|entry| {
            let prefix: String = entry.name.to_uppercase().chars().take(query_len).collect();
            ScoredEntry {
                entry,
                score: ratio(&prefix, &query_upper),
            }
        })
        .collect();

    // Stable sort, so equal scores stay in catalog order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let best_score = ranked.first().map_or(0, |r| r.score);
    if best_score <= MIN_SEARCH_SCORE {
        return Err(SearchError::TooVague {
            query: query.to_string(),
            best_score,
            suggestions: ranked
                .iter()
                .take(SUGGESTION_COUNT)
                .map(|r| r.entry.name.clone())
                .collect(),
        });
    }

    Ok(ranked
        .into_iter()
        .filter(|r| within_tolerance(r.score, best_score))
        .collect())
}

/// `score > best - best / 10`, evaluated without rounding
fn within_tolerance(score: u8, best: u8) -> bool {
    10 * u32::from(score) > 9 * u32::from(best)
}
