//! Staged workspace cache
//!
//! Per-document results are memoized in four stages, each built from the
//! previous one: lex, snapshot, parse, inspect. Successes and failures
//! are both cached; a failed prerequisite is returned unchanged by every
//! later stage, tagged with the stage that produced it. The one
//! exception is cancellation: a canceled inspection is never stored, so
//! the next request recomputes it.
//!
//! Invalidation is wholesale per document. An edited document drops all
//! four stages at once; there is no incremental reuse.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use fathom_syntax::{lex, parse, LexState, LexerSnapshot, ParseOutcome, Position, Type};

use crate::error::{AnalysisResult, StageFailure};
use crate::inspect::{inspect, InspectionOutcome};

/// The four memoized stages, in build order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheStage {
    Lex,
    Snapshot,
    Parse,
    Inspect,
}

/// An open document the cache computes over
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: String,
    pub text: Arc<str>,
}

impl Document {
    pub fn new(uri: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
        }
    }
}

type StageSlot<T> = Option<Result<Arc<T>, StageFailure>>;

#[derive(Debug, Default)]
struct DocumentEntry {
    lex: StageSlot<LexState>,
    snapshot: StageSlot<LexerSnapshot>,
    parse: StageSlot<ParseOutcome>,
    inspections: HashMap<Position, Arc<InspectionOutcome>>,
}

/// Memoizing cache over every open document
#[derive(Debug, Clone, Default)]
pub struct WorkspaceCache {
    entries: Arc<RwLock<HashMap<String, DocumentEntry>>>,
}

impl WorkspaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex the document, or return the memoized result
    pub fn get_or_lex(&self, document: &Document) -> Result<Arc<LexState>, StageFailure> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(document.uri.clone()).or_default();
        if let Some(cached) = &entry.lex {
            debug!(uri = %document.uri, "lex cache hit");
            return cached.clone();
        }
        debug!(uri = %document.uri, "lex cache miss");
        let result = lex(&document.text)
            .map(Arc::new)
            .map_err(|err| StageFailure::new(CacheStage::Lex, err));
        entry.lex = Some(result.clone());
        result
    }

    /// Build the trivia-free snapshot, or return the memoized result
    pub fn get_or_snapshot(
        &self,
        document: &Document,
    ) -> Result<Arc<LexerSnapshot>, StageFailure> {
        if let Some(cached) = self.cached_snapshot(&document.uri) {
            debug!(uri = %document.uri, "snapshot cache hit");
            return cached;
        }
        let result = self
            .get_or_lex(document)
            .map(|state| Arc::new(LexerSnapshot::new(&state, &document.text)));
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(document.uri.clone()).or_default();
        entry.snapshot = Some(result.clone());
        result
    }

    /// Parse the document, or return the memoized result
    pub fn get_or_parse(&self, document: &Document) -> Result<Arc<ParseOutcome>, StageFailure> {
        if let Some(cached) = self.cached_parse(&document.uri) {
            debug!(uri = %document.uri, "parse cache hit");
            return cached;
        }
        let result = self
            .get_or_snapshot(document)
            .map(|snapshot| Arc::new(parse(&snapshot)));
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(document.uri.clone()).or_default();
        entry.parse = Some(result.clone());
        result
    }

    /// Inspect a position, or return the memoized outcome
    ///
    /// Canceled inspections are returned but never cached.
    pub async fn get_or_inspect(
        &self,
        document: &Document,
        position: Position,
        externals: &HashMap<String, Type>,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Arc<InspectionOutcome>> {
        if let Some(cached) = self.cached_inspection(&document.uri, position) {
            debug!(uri = %document.uri, ?position, "inspection cache hit");
            return Ok(cached);
        }
        debug!(uri = %document.uri, ?position, "inspection cache miss");
        let parse = self.get_or_parse(document)?;
        let snapshot = self.get_or_snapshot(document)?;
        let outcome = inspect(&parse, &snapshot, position, externals, cancel).await?;
        let outcome = Arc::new(outcome);
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(document.uri.clone()).or_default();
        entry.inspections.insert(position, outcome.clone());
        Ok(outcome)
    }

    /// Drop every cached stage for a document; called on edit
    pub fn invalidate(&self, uri: &str) {
        let mut entries = self.entries.write().unwrap();
        if entries.remove(uri).is_some() {
            debug!(uri, "document invalidated");
        }
    }

    /// Drop a closed document entirely
    pub fn close(&self, uri: &str) {
        self.invalidate(uri);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Number of documents with at least one cached stage
    pub fn document_count(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    fn cached_snapshot(&self, uri: &str) -> Option<Result<Arc<LexerSnapshot>, StageFailure>> {
        self.entries
            .read()
            .unwrap()
            .get(uri)
            .and_then(|entry| entry.snapshot.clone())
    }

    fn cached_parse(&self, uri: &str) -> Option<Result<Arc<ParseOutcome>, StageFailure>> {
        self.entries
            .read()
            .unwrap()
            .get(uri)
            .and_then(|entry| entry.parse.clone())
    }

    fn cached_inspection(&self, uri: &str, position: Position) -> Option<Arc<InspectionOutcome>> {
        self.entries
            .read()
            .unwrap()
            .get(uri)
            .and_then(|entry| entry.inspections.get(&position).cloned())
    }
}
