use serde::Serialize;

/// What went wrong, beyond the human-readable message.
///
/// `UnknownType` and `UnknownProperty` are separate from `Syntax` because
/// callers routinely want to handle "this widget type does not exist" (a
/// registry problem) differently from malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    /// The tokenizer produced an error token (unrecognized character run).
    Lexical,
    /// A grammar violation: missing brace, missing terminator, stray input
    /// after the root block, and so on.
    Syntax,
    /// A type name that the registry could not resolve.
    UnknownType { type_name: String },
    /// A property name the target widget did not recognize.
    UnknownProperty { type_name: String, property: String },
}

/// A parse failure with full source context. The first error aborts the
/// whole parse; there is no multi-error collection.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub file: String,
    /// 1-based line of the offending token.
    pub line: u32,
    /// 1-based column of the offending token.
    pub column: u32,
    /// A windowed copy of the offending source line plus a `^^^` marker
    /// line, ready for direct display. `None` when the line is not
    /// available (e.g. an error position past the end of input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        file: &str,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            file: file.to_owned(),
            line,
            column,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: String) -> Self {
        self.snippet = Some(snippet);
        self
    }

    /// Full diagnostic text: location line followed by the source snippet.
    pub fn render(&self) -> String {
        match &self.snippet {
            Some(snippet) => format!("{}\n{}", self, snippet),
            None => self.to_string(),
        }
    }

    /// Serialize to a JSON value with a fixed field set (kind flattened to
    /// a tag plus optional name fields), for tooling output.
    pub fn to_json_value(&self) -> serde_json::Value {
        let (kind, type_name, property) = match &self.kind {
            ParseErrorKind::Lexical => ("lexical", None, None),
            ParseErrorKind::Syntax => ("syntax", None, None),
            ParseErrorKind::UnknownType { type_name } => {
                ("unknown-type", Some(type_name.clone()), None)
            }
            ParseErrorKind::UnknownProperty {
                type_name,
                property,
            } => (
                "unknown-property",
                Some(type_name.clone()),
                Some(property.clone()),
            ),
        };
        serde_json::json!({
            "kind":      kind,
            "type_name": type_name,
            "property":  property,
            "file":      self.file,
            "line":      self.line,
            "column":    self.column,
            "message":   self.message,
            "snippet":   self.snippet,
        })
    }
}

/// How many characters of the offending line to show on each side of the
/// error column.
const SNIPPET_WINDOW: usize = 30;

/// Build the two-line diagnostic snippet for a source line: a window of
/// the line around `column` (1-based), then a marker line pointing at it.
pub fn source_snippet(line_text: &str, column: u32) -> String {
    let chars: Vec<char> = line_text.chars().collect();
    let at = (column as usize).saturating_sub(1).min(chars.len());
    let start = at.saturating_sub(SNIPPET_WINDOW);
    let end = (at + SNIPPET_WINDOW).min(chars.len());

    let mut text = String::new();
    if start > 0 {
        text.push_str("...");
    }
    text.extend(&chars[start..end]);
    if end < chars.len() {
        text.push_str("...");
    }

    let pad = at - start + if start > 0 { 3 } else { 0 };
    let mut out = String::with_capacity(text.len() + pad + 4);
    out.push_str(&text);
    out.push('\n');
    for _ in 0..pad {
        out.push(' ');
    }
    out.push_str("^^^");
    out
}
