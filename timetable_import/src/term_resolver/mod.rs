mod label;
mod options;

pub use label::{current_term_label, week_of_month, Season};
pub use options::{Term, TermId, TermLabel, TermOptions};

use crate::errors::TermResolutionError;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Deserialize;
use tracing::{info, warn};

/// What to do when no offered term matches the expected label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermFallback {
    /// Use the first term the page offers.
    #[default]
    FirstAvailable,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTerm {
    pub term: Term,
    pub kind: MatchKind,
}

/// Picks the term for `target`: exact label first, then a label containing it, both
/// ignoring case, then whatever `fallback` allows.
pub fn resolve_term_id(
    options: &TermOptions,
    target: &str,
    fallback: TermFallback,
) -> Result<ResolvedTerm, TermResolutionError> {
    if options.is_empty() {
        return Err(TermResolutionError::NoOptions);
    }
    let target_lower = target.to_lowercase();

    let resolved = |term: &Term, kind| ResolvedTerm {
        term: term.clone(),
        kind,
    };

    if let Some(term) = options
        .iter()
        .find(|term| term.label.as_ref().to_lowercase() == target_lower)
    {
        return Ok(resolved(term, MatchKind::Exact));
    }

    let partial = options
        .iter()
        .filter(|term| term.label.as_ref().to_lowercase().contains(&target_lower))
        .collect::<Vec<_>>();
    if let Some(&term) = partial.first() {
        if partial.len() > 1 {
            warn!(
                expected = target,
                candidates = %partial.iter().map(|term| term.label.as_ref()).join(", "),
                chosen = %term.label,
                "Several terms contain the expected label, taking the first"
            );
        }
        return Ok(resolved(term, MatchKind::Partial));
    }

    match (fallback, options.first()) {
        (TermFallback::FirstAvailable, Some(term)) => {
            warn!(
                expected = target,
                fallback_label = %term.label,
                fallback_id = %term.id,
                "No term matches the expected label, falling back to the first available"
            );
            Ok(resolved(term, MatchKind::Fallback))
        }
        _ => Err(TermResolutionError::NoMatch {
            target: target.to_string(),
        }),
    }
}

pub struct TermResolver {
    fallback: TermFallback,
}

impl TermResolver {
    pub fn new(fallback: TermFallback) -> Self {
        Self { fallback }
    }

    #[tracing::instrument(skip(self, document), level = "info")]
    pub fn resolve(
        &self,
        document: &str,
        today: NaiveDate,
    ) -> Result<ResolvedTerm, TermResolutionError> {
        let target = current_term_label(today);
        let options = TermOptions::from_document(document);
        let resolved = resolve_term_id(&options, &target, self.fallback)?;
        info!(
            expected = %target,
            label = %resolved.term.label,
            id = %resolved.term.id,
            kind = ?resolved.kind,
            "Resolved term"
        );
        Ok(resolved)
    }
}
