//! Result types the service hands to front ends
//!
//! Everything here is serializable so a protocol layer can pass results
//! through unchanged.

use serde::{Deserialize, Serialize};

use fathom_syntax::Range;

/// What kind of thing an autocomplete item names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Variable,
    Parameter,
    Field,
    SectionMember,
    Keyword,
    Function,
    Constant,
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteItem {
    pub label: String,
    pub kind: ItemKind,
    pub insert_text: String,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    /// Similarity against the typed prefix, used for presentation order
    pub score: f64,
}

impl AutocompleteItem {
    pub fn new(label: impl Into<String>, kind: ItemKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            kind,
            detail: None,
            documentation: None,
            score: 0.0,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    /// Markdown contents
    pub contents: String,
    /// The range the hover applies to, when known
    pub range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub label: String,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// Full rendered signature, e.g. `(a: number, optional b: text) -> any`
    pub label: String,
    pub parameters: Vec<ParameterInfo>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureHelp {
    pub signatures: Vec<SignatureInfo>,
    pub active_signature: u32,
    /// Zero-based argument slot under the cursor
    pub active_parameter: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoldingRange {
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// An identifier token classified by the binding its name resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticToken {
    pub range: Range,
    pub kind: ItemKind,
}
