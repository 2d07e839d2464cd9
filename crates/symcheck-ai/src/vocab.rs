//! Ordered string tables: the feature vocabulary and the class-label table.
//!
//! Both are stored as newline-delimited UTF-8 text, one entry per line, in
//! index order. Lines are trimmed and blank lines are skipped. Position is
//! load-bearing: entry `i` is model input `i` (vocabulary) or model output
//! `i` (labels), so a table is never sorted or deduplicated after loading.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::ArtifactError;

/// An ordered, duplicate-free list of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermTable {
    terms: Vec<String>,
}

impl TermTable {
    /// Build a table from in-memory terms, rejecting blanks and duplicates.
    ///
    /// Terms are trimmed the same way as lines read from disk.
    pub fn new<I, S>(terms: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for (i, term) in terms.into_iter().enumerate() {
            let term = term.as_ref().trim();
            if term.is_empty() {
                return Err(format!("entry {i} is blank"));
            }
            if !seen.insert(term.to_string()) {
                return Err(format!("duplicate entry '{term}' at index {i}"));
            }
            out.push(term.to_string());
        }
        if out.is_empty() {
            return Err("table is empty".into());
        }
        Ok(Self { terms: out })
    }

    /// Parse newline-delimited text.
    pub fn parse(text: &str) -> Result<Self, String> {
        Self::new(text.lines().filter(|line| !line.trim().is_empty()))
    }

    /// Read a table from any reader.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, String> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| format!("read: {e}"))?;
        Self::parse(&text)
    }

    /// Load a table file. Any failure is reported as a corrupt artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let file = std::fs::File::open(path).map_err(|e| ArtifactError::corrupt(path, e.to_string()))?;
        Self::from_reader(file).map_err(|reason| ArtifactError::corrupt(path, reason))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Index of an exact (case-sensitive) entry.
    pub fn position(&self, term: &str) -> Option<usize> {
        self.terms.iter().position(|t| t == term)
    }
}
