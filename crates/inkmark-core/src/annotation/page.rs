//! Per-page annotation content.

use super::{Stroke, TextAnnotation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strokes and text notes of a single page, in insertion (paint) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnnotations {
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub texts: Vec<TextAnnotation>,
}

impl PageAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.texts.is_empty()
    }
}

/// Mapping from 1-based page number to that page's annotations.
///
/// Iterates in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageAnnotationSet {
    pages: BTreeMap<u32, PageAnnotations>,
}

impl PageAnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations of a page; unknown pages read as empty.
    pub fn page(&self, page_number: u32) -> Option<&PageAnnotations> {
        self.pages.get(&page_number)
    }

    /// Mutable annotations of a page, created empty on first access.
    pub fn page_mut(&mut self, page_number: u32) -> &mut PageAnnotations {
        self.pages.entry(page_number).or_default()
    }

    /// Replace a page's content; empty pages are dropped from the map.
    pub fn set_page(&mut self, page_number: u32, annotations: PageAnnotations) {
        if annotations.is_empty() {
            self.pages.remove(&page_number);
        } else {
            self.pages.insert(page_number, annotations);
        }
    }

    /// Pages in ascending order, including ones left empty by edits.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &PageAnnotations)> {
        self.pages.iter().map(|(n, p)| (*n, p))
    }

    /// Page numbers holding at least one stroke or text note.
    pub fn pages_with_content(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, p)| !p.is_empty())
            .map(|(n, _)| *n)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(PageAnnotations::is_empty)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
