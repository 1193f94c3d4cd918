//! Document review tracking.
//!
//! During the document-review step the attendee must open every reference link
//! before continuing. [`ReviewTracker`] snapshots the link collection when the
//! step starts and records which links have been opened.

use std::collections::HashSet;

use tracing::debug;

/// One row of the document list shown to the attendee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry<'a> {
    /// Position in the list (0-based).
    pub position: usize,
    /// Display label, e.g. `Documento 1: Ver aquí`.
    pub label: String,
    /// Target URL.
    pub url: &'a str,
    /// Whether the attendee has opened this link.
    pub visited: bool,
}

/// Tracks which document links the attendee has opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTracker {
    links: Vec<String>,
    visited: HashSet<String>,
}

impl ReviewTracker {
    /// Start tracking a snapshot of the link collection.
    ///
    /// Repeated links are kept once, at their first position.
    #[must_use]
    pub fn new(links: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let links = links
            .into_iter()
            .filter(|link| seen.insert(link.clone()))
            .collect();
        Self {
            links,
            visited: HashSet::new(),
        }
    }

    /// Record that `url` was opened.
    ///
    /// Opening the same link twice leaves the set unchanged. Returns `None` when
    /// `url` is not one of the tracked links, otherwise whether it was newly
    /// recorded.
    pub fn mark_visited(&mut self, url: &str) -> Option<bool> {
        if !self.links.iter().any(|link| link == url) {
            return None;
        }
        let inserted = self.visited.insert(url.to_string());
        debug!(url, inserted, "document opened");
        Some(inserted)
    }

    /// Record that the link at `position` was opened, returning its URL.
    pub fn open(&mut self, position: usize) -> Option<&str> {
        let url = self.links.get(position)?.clone();
        self.mark_visited(&url);
        self.links.get(position).map(String::as_str)
    }

    /// Whether `url` has been opened.
    #[must_use]
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of distinct links opened.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of links to review.
    #[must_use]
    pub fn total(&self) -> usize {
        self.links.len()
    }

    /// True once every link has been opened at least once.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.visited.len() == self.links.len()
    }

    /// The tracked links, in display order.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Display rows for the document list.
    pub fn entries(&self) -> impl Iterator<Item = ReviewEntry<'_>> {
        self.links.iter().enumerate().map(|(position, url)| ReviewEntry {
            position,
            label: format!("Documento {}: Ver aquí", position + 1),
            url,
            visited: self.visited.contains(url),
        })
    }

    /// Label of the continue button.
    #[must_use]
    pub fn continue_label(&self) -> &'static str {
        if self.is_complete() {
            "He revisado los documentos, continuar"
        } else {
            "Debe revisar todos los documentos"
        }
    }
}
