//! Weighted multi-field relevance ranking for listing endpoints.

use std::cmp::Ordering;

/// Field weight classes, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    A,
    B,
    C,
    D,
}

impl Weight {
    pub const fn factor(self) -> f64 {
        match self {
            Weight::A => 1.0,
            Weight::B => 0.4,
            Weight::C => 0.2,
            Weight::D => 0.1,
        }
    }
}

/// A trimmed, non-empty search term with its normalized stems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    needle: String,
    stems: Vec<String>,
}

impl SearchTerm {
    /// `None` for absent or blank input: callers then skip ranking entirely.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        let mut stems: Vec<String> = tokens(raw).map(|token| stem(&token)).collect();
        stems.dedup();
        Some(Self {
            raw: raw.to_string(),
            needle: raw.to_lowercase(),
            stems,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive substring filter over the searchable fields.
    pub fn matches_any(&self, fields: &[Option<&str>]) -> bool {
        fields
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }

    /// Relevance of a document. Every stem of the term must occur somewhere;
    /// otherwise the document has no score and sorts after scored ones.
    pub fn score(&self, fields: &[(Option<&str>, Weight)]) -> Option<f64> {
        if self.stems.is_empty() {
            return None;
        }

        let documents: Vec<(Vec<String>, Weight)> = fields
            .iter()
            .filter_map(|(text, weight)| {
                text.map(|text| (tokens(text).map(|token| stem(&token)).collect(), *weight))
            })
            .collect();

        let mut total = 0.0;
        for query_stem in &self.stems {
            let mut stem_score = 0.0;
            for (document, weight) in &documents {
                let hits = document.iter().filter(|token| *token == query_stem).count();
                if hits > 0 {
                    stem_score += weight.factor() * (1.0 + (hits as f64).ln());
                }
            }
            if stem_score == 0.0 {
                return None;
            }
            total += stem_score;
        }
        Some(total)
    }
}

/// Orders rows by descending score (unscored last), then by `fallback`.
///
/// Without a term no scoring happens and `fallback` alone decides the order.
pub fn rank<T, S, F>(rows: Vec<T>, term: Option<&SearchTerm>, scorer: S, fallback: F) -> Vec<T>
where
    S: Fn(&SearchTerm, &T) -> Option<f64>,
    F: Fn(&T, &T) -> Ordering,
{
    match term {
        None => {
            let mut rows = rows;
            rows.sort_by(|a, b| fallback(a, b));
            rows
        }
        Some(term) => {
            let mut scored: Vec<(Option<f64>, T)> = rows
                .into_iter()
                .map(|row| (scorer(term, &row), row))
                .collect();
            scored.sort_by(|(left_score, left), (right_score, right)| {
                compare_scores(*left_score, *right_score).then_with(|| fallback(left, right))
            });
            scored.into_iter().map(|(_, row)| row).collect()
        }
    }
}

fn compare_scores(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Light suffix stripping so "Robotics", "robots" and "robot" share a stem.
fn stem(token: &str) -> String {
    const SUFFIXES: [(&str, &str); 10] = [
        ("ations", ""),
        ("ation", ""),
        ("ings", ""),
        ("ing", ""),
        ("ics", ""),
        ("ies", "y"),
        ("es", ""),
        ("ed", ""),
        ("ly", ""),
        ("s", ""),
    ];

    for (suffix, replacement) in SUFFIXES {
        if let Some(base) = token.strip_suffix(suffix) {
            if base.chars().count() >= 3 {
                return format!("{base}{replacement}");
            }
        }
    }
    token.to_string()
}
