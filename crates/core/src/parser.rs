//! Stack-driven recursive-descent parser: token stream in, widget tree
//! out.
//!
//! The parser pulls tokens lazily from a [`Tokenizer`], keeps an explicit
//! array-backed stack of the widgets currently being populated (so
//! pathological nesting depth cannot blow the call stack), and resolves
//! every type name through the injected [`WidgetFactory`]. The first
//! error aborts the parse; any subtree the parser created itself is
//! dropped with the stack, while a caller-supplied context widget is only
//! ever borrowed and survives intact.

use crate::error::{source_snippet, ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind, Tokenizer};
use crate::widget::{
    alignment_keyword, IdentityUnits, ListEntry, Orientation, RectOffset, UnitResolver, Widget,
    WidgetFactory, WidgetHandle,
};

/// Property names whose string values always go through
/// [`Widget::set_raw_string`], bypassing any richer conversion the object
/// model does for other string properties.
const RAW_STRING_PROPERTIES: [&str; 3] = ["id", "styleID", "backgroundImageID"];

/// Parser configuration: the collaborators every parse runs against.
/// Construct once, parse many times; a parse only reads the factory, so
/// concurrent parses over one `Parser` are safe.
pub struct Parser<'r> {
    factory: &'r dyn WidgetFactory,
    units: &'r dyn UnitResolver,
}

impl<'r> Parser<'r> {
    /// A parser with identity unit conversion.
    pub fn new(factory: &'r dyn WidgetFactory) -> Self {
        Parser {
            factory,
            units: &IdentityUnits,
        }
    }

    /// A parser with an injected unit-conversion policy.
    pub fn with_units(factory: &'r dyn WidgetFactory, units: &'r dyn UnitResolver) -> Self {
        Parser { factory, units }
    }

    /// Parse a document whose root type is named in the source
    /// (`Column { ... }`). Returns the fully populated root.
    pub fn parse(&self, source: &str, filename: &str) -> Result<WidgetHandle, ParseError> {
        let mut session = Session::new(source, filename, self.factory, self.units);
        match session.run(None)? {
            Some(root) => Ok(root),
            // run(None) either errors or hands back the root it created.
            None => unreachable!("parse without context always owns the root"),
        }
    }

    /// Parse into a caller-supplied root ("context") object. The source
    /// must start directly with `{`; naming a root type as well is a
    /// redefinition error. The context is never destroyed by the parser,
    /// even on failure.
    pub fn parse_into(
        &self,
        source: &str,
        filename: &str,
        context: &mut dyn Widget,
    ) -> Result<(), ParseError> {
        let mut session = Session::new(source, filename, self.factory, self.units);
        session.run(Some(context))?;
        Ok(())
    }
}

/// Convenience wrapper for the common case: identity units, fresh parser.
pub fn parse(
    source: &str,
    filename: &str,
    factory: &dyn WidgetFactory,
) -> Result<WidgetHandle, ParseError> {
    Parser::new(factory).parse(source, filename)
}

/// One entry of the parse stack: the widget currently receiving property
/// assignments. Only the bottom frame can be a borrowed context; every
/// frame above it is parser-owned until it is popped and appended to its
/// parent.
enum Frame<'c> {
    Context(&'c mut dyn Widget),
    Owned(WidgetHandle),
}

impl Frame<'_> {
    fn widget(&mut self) -> &mut dyn Widget {
        match self {
            Frame::Context(w) => &mut **w,
            Frame::Owned(w) => &mut **w,
        }
    }
}

/// Per-parse state: tokenizer, one token of lookahead, and the source
/// lines kept around for diagnostic snippets.
struct Session<'r, 's> {
    tokens: Tokenizer<'s>,
    peeked: Option<Token>,
    lines: Vec<&'s str>,
    filename: &'s str,
    factory: &'r dyn WidgetFactory,
    units: &'r dyn UnitResolver,
}

impl<'r, 's> Session<'r, 's> {
    fn new(
        source: &'s str,
        filename: &'s str,
        factory: &'r dyn WidgetFactory,
        units: &'r dyn UnitResolver,
    ) -> Self {
        Session {
            tokens: Tokenizer::new(source),
            peeked: None,
            lines: source
                .split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l))
                .collect(),
            filename,
            factory,
            units,
        }
    }

    // ── Token plumbing ───────────────────────────────────────────

    fn next_raw(&mut self) -> Token {
        match self.peeked.take() {
            Some(tok) => tok,
            None => self.tokens.next_token(),
        }
    }

    fn unread(&mut self, tok: Token) {
        self.peeked = Some(tok);
    }

    /// Next token that is not whitespace or a comment. Line ends are
    /// skipped too when `skip_newlines` is set; in value and terminator
    /// positions they are significant and must be seen. Error tokens are
    /// fatal everywhere, so they are converted here.
    fn significant(&mut self, skip_newlines: bool) -> Result<Token, ParseError> {
        loop {
            let tok = self.next_raw();
            match &tok.kind {
                TokenKind::Whitespace | TokenKind::Comment { .. } => continue,
                TokenKind::Eol if skip_newlines => continue,
                TokenKind::Error(text) => {
                    let message = format!("unrecognized character sequence '{}'", text);
                    return Err(self.error_at(ParseErrorKind::Lexical, &tok, message));
                }
                _ => return Ok(tok),
            }
        }
    }

    // ── Error construction ───────────────────────────────────────

    fn error_at(
        &self,
        kind: ParseErrorKind,
        tok: &Token,
        message: impl Into<String>,
    ) -> ParseError {
        let mut err = ParseError::new(kind, self.filename, tok.line, tok.column, message);
        if let Some(line_text) = self.lines.get(tok.line as usize - 1) {
            err = err.with_snippet(source_snippet(line_text, tok.column));
        }
        err
    }

    fn syntax(&self, tok: &Token, message: impl Into<String>) -> ParseError {
        self.error_at(ParseErrorKind::Syntax, tok, message)
    }

    fn unknown_type(&self, tok: &Token, type_name: &str) -> ParseError {
        self.error_at(
            ParseErrorKind::UnknownType {
                type_name: type_name.to_owned(),
            },
            tok,
            format!("unknown widget type '{}'", type_name),
        )
    }

    fn unknown_property(&self, target: &dyn Widget, property: &str, tok: &Token) -> ParseError {
        self.error_at(
            ParseErrorKind::UnknownProperty {
                type_name: target.type_name().to_owned(),
                property: property.to_owned(),
            },
            tok,
            format!(
                "widget type '{}' has no property '{}'",
                target.type_name(),
                property
            ),
        )
    }

    // ── Document driver ──────────────────────────────────────────

    /// Parse one document. With `context`, the source must open with a
    /// bare `{` and `Ok(None)` is returned; without it, the root type
    /// named in the source is instantiated and returned as `Ok(Some(..))`.
    fn run(
        &mut self,
        context: Option<&mut dyn Widget>,
    ) -> Result<Option<WidgetHandle>, ParseError> {
        let mut stack: Vec<Frame> = Vec::new();

        let first = self.significant(true)?;
        match first.kind {
            TokenKind::Ident(ref name) => {
                if context.is_some() {
                    return Err(self.syntax(
                        &first,
                        format!(
                            "root type '{}' conflicts with the context object already supplied",
                            name
                        ),
                    ));
                }
                let root = self.create_widget(name, &first)?;
                let open = self.significant(true)?;
                if open.kind != TokenKind::LBrace {
                    return Err(
                        self.syntax(&open, format!("expected '{{' after type name '{}'", name))
                    );
                }
                stack.push(Frame::Owned(root));
            }
            TokenKind::LBrace => match context {
                Some(ctx) => stack.push(Frame::Context(ctx)),
                None => return Err(self.syntax(&first, "expected a widget type name before '{'")),
            },
            TokenKind::Eof => {
                return Err(self.syntax(&first, "unexpected end of file: expected a widget block"))
            }
            _ => return Err(self.syntax(&first, "expected a widget type name or '{'")),
        }

        // Invariant: the stack is never empty inside this loop; the final
        // pop returns out of the function.
        loop {
            let tok = self.significant(true)?;
            match tok.kind {
                TokenKind::RBrace => {
                    let Some(frame) = stack.pop() else {
                        return Err(self.syntax(&tok, "unmatched '}'"));
                    };
                    if stack.is_empty() {
                        let trailing = self.significant(true)?;
                        if trailing.kind != TokenKind::Eof {
                            return Err(
                                self.syntax(&trailing, "end of file expected after the root block")
                            );
                        }
                        return Ok(match frame {
                            Frame::Owned(root) => Some(root),
                            Frame::Context(_) => None,
                        });
                    }
                    if let Frame::Owned(child) = frame {
                        if let Some(parent) = stack.last_mut() {
                            parent.widget().append_child(child);
                        }
                    }
                }
                TokenKind::Ident(ref name) => {
                    let sep = self.significant(true)?;
                    match sep.kind {
                        TokenKind::Colon => {
                            let Some(frame) = stack.last_mut() else {
                                return Err(self.syntax(&tok, "property outside a widget block"));
                            };
                            self.parse_property(frame.widget(), name, &tok)?;
                        }
                        TokenKind::LBrace => {
                            let child = self.create_widget(name, &tok)?;
                            stack.push(Frame::Owned(child));
                        }
                        _ => {
                            return Err(self.syntax(
                                &sep,
                                format!("expected ':' or '{{' after '{}'", name),
                            ))
                        }
                    }
                }
                TokenKind::Eof => {
                    return Err(self.syntax(&tok, "unexpected end of file: unclosed widget block"))
                }
                _ => return Err(self.syntax(&tok, "expected a property or widget name")),
            }
        }
    }

    fn create_widget(&self, name: &str, tok: &Token) -> Result<WidgetHandle, ParseError> {
        self.factory
            .create(name)
            .ok_or_else(|| self.unknown_type(tok, name))
    }

    // ── Property values ──────────────────────────────────────────

    /// Everything after `name :`. Dispatches on the first significant
    /// token of the value and finishes with the terminator check.
    fn parse_property(
        &mut self,
        target: &mut dyn Widget,
        name: &str,
        name_tok: &Token,
    ) -> Result<(), ParseError> {
        let tok = self.significant(false)?;
        match &tok.kind {
            TokenKind::Int { value, suffix } => {
                let value = self.apply_unit(*value, suffix, &tok)?;
                self.assign_int(target, name, value, name_tok)?;
                self.expect_terminator()
            }
            TokenKind::Float { value, .. } => {
                self.assign_float(target, name, *value, name_tok)?;
                self.expect_terminator()
            }
            TokenKind::Minus | TokenKind::Plus => {
                let negative = tok.kind == TokenKind::Minus;
                let lit = self.significant(false)?;
                match &lit.kind {
                    TokenKind::Int { value, suffix } => {
                        let value = self.apply_unit(*value, suffix, &lit)?;
                        let value = if negative { -value } else { value };
                        self.assign_int(target, name, value, name_tok)?;
                    }
                    TokenKind::Float { value, .. } => {
                        let value = if negative { -*value } else { *value };
                        self.assign_float(target, name, value, name_tok)?;
                    }
                    _ => return Err(self.syntax(&lit, "expected a number after the sign")),
                }
                self.expect_terminator()
            }
            TokenKind::Str(text) => {
                let recognized = if RAW_STRING_PROPERTIES.contains(&name) {
                    target.set_raw_string(name, text)
                } else {
                    target.set_string(name, text)
                };
                if !recognized {
                    return Err(self.unknown_property(target, name, name_tok));
                }
                self.expect_terminator()
            }
            TokenKind::LBracket => {
                let items = self.parse_list()?;
                if !target.set_list(name, items) {
                    return Err(self.unknown_property(target, name, name_tok));
                }
                self.expect_terminator()
            }
            TokenKind::Ident(word) => {
                let word = word.clone();
                self.parse_ident_value(target, name, name_tok, &word, &tok)
            }
            _ => Err(self.syntax(&tok, format!("expected a value for property '{}'", name))),
        }
    }

    /// Identifier in value position: boolean and alignment keywords, the
    /// orientation pair (only for the `orientation` property), the `Rect`
    /// quad opener, and finally the generic string fallback.
    fn parse_ident_value(
        &mut self,
        target: &mut dyn Widget,
        name: &str,
        name_tok: &Token,
        word: &str,
        word_tok: &Token,
    ) -> Result<(), ParseError> {
        match word {
            "true" => {
                self.assign_bool(target, name, true, name_tok)?;
                self.expect_terminator()
            }
            "false" => {
                self.assign_bool(target, name, false, name_tok)?;
                self.expect_terminator()
            }
            "Rect" => {
                let rect = self.parse_rect_block(word_tok)?;
                if !target.set_rect(name, rect) {
                    return Err(self.unknown_property(target, name, name_tok));
                }
                self.expect_terminator()
            }
            _ => {
                if let Some(alignment) = alignment_keyword(word) {
                    self.assign_int(target, name, alignment as i64, name_tok)?;
                    return self.expect_terminator();
                }
                if name == "orientation" && (word == "vertical" || word == "horizontal") {
                    let orientation = if word == "vertical" {
                        Orientation::Vertical
                    } else {
                        Orientation::Horizontal
                    };
                    self.assign_int(target, name, orientation as i64, name_tok)?;
                    return self.expect_terminator();
                }
                // Not a keyword: fall through to the string setter, and
                // only report the property unknown if that fails too.
                if !target.set_string(name, word) {
                    return Err(self.unknown_property(target, name, name_tok));
                }
                self.expect_terminator()
            }
        }
    }

    /// `[ item, item, ... ]`. Items are bare integers (no unit suffix),
    /// identifiers, or string literals; line breaks are allowed anywhere
    /// inside the brackets.
    fn parse_list(&mut self) -> Result<Vec<ListEntry>, ParseError> {
        let mut items = Vec::new();
        loop {
            let tok = self.significant(true)?;
            match &tok.kind {
                TokenKind::RBracket => return Ok(items),
                TokenKind::Int { value, suffix } => {
                    if !suffix.is_empty() {
                        return Err(self.syntax(
                            &tok,
                            format!("unit suffix '{}' is not allowed in a list", suffix),
                        ));
                    }
                    items.push(ListEntry::from_int(*value));
                }
                TokenKind::Ident(word) => items.push(ListEntry::from_label(word.clone())),
                TokenKind::Str(text) => items.push(ListEntry::from_label(text.clone())),
                TokenKind::Eof => {
                    return Err(self.syntax(&tok, "unexpected end of file inside a list"))
                }
                _ => return Err(self.syntax(&tok, "expected a list item or ']'")),
            }
            let sep = self.significant(true)?;
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::RBracket => return Ok(items),
                TokenKind::Eof => {
                    return Err(self.syntax(&sep, "unexpected end of file inside a list"))
                }
                _ => return Err(self.syntax(&sep, "expected ',' or ']' in a list")),
            }
        }
    }

    /// `Rect { ... }`: four positional integers separated by `,`/`;`, or
    /// named `left:`/`top:`/`right:`/`bottom:` fields, in any mixture (the
    /// grammar deliberately does not reject mixing). Named fields do not
    /// advance the positional cursor.
    fn parse_rect_block(&mut self, rect_tok: &Token) -> Result<RectOffset, ParseError> {
        let open = self.significant(true)?;
        if open.kind != TokenKind::LBrace {
            return Err(self.syntax(&open, "expected '{' after 'Rect'"));
        }
        let mut rect = RectOffset::default();
        let mut position = 0usize;
        loop {
            let tok = self.significant(true)?;
            match &tok.kind {
                TokenKind::RBrace => return Ok(rect),
                TokenKind::Comma | TokenKind::Semicolon => continue,
                TokenKind::Int { value, suffix } => {
                    let value = self.apply_unit(*value, suffix, &tok)?;
                    match position {
                        0 => rect.left = value,
                        1 => rect.top = value,
                        2 => rect.right = value,
                        3 => rect.bottom = value,
                        _ => return Err(self.syntax(&tok, "too many values in a 'Rect' block")),
                    }
                    position += 1;
                }
                TokenKind::Ident(field)
                    if matches!(field.as_str(), "left" | "top" | "right" | "bottom") =>
                {
                    let field = field.clone();
                    let colon = self.significant(true)?;
                    if colon.kind != TokenKind::Colon {
                        return Err(self.syntax(&colon, format!("expected ':' after '{}'", field)));
                    }
                    let lit = self.significant(true)?;
                    let TokenKind::Int { value, suffix } = &lit.kind else {
                        return Err(
                            self.syntax(&lit, format!("expected an integer for '{}'", field))
                        );
                    };
                    let value = self.apply_unit(*value, suffix, &lit)?;
                    match field.as_str() {
                        "left" => rect.left = value,
                        "top" => rect.top = value,
                        "right" => rect.right = value,
                        _ => rect.bottom = value,
                    }
                }
                TokenKind::Eof => {
                    return Err(self.error_at(
                        ParseErrorKind::Syntax,
                        rect_tok,
                        "unterminated 'Rect' block",
                    ))
                }
                _ => return Err(self.syntax(&tok, "expected a 'Rect' field or '}'")),
            }
        }
    }

    // ── Scalar assignment helpers ────────────────────────────────

    fn apply_unit(&self, raw: i64, suffix: &str, tok: &Token) -> Result<i64, ParseError> {
        match suffix {
            "" | "px" => Ok(raw),
            "pt" | "em" | "m" => Ok(self.units.point_size(raw)),
            "%" => Ok(self.units.percent_size(raw)),
            other => Err(self.syntax(tok, format!("unknown unit suffix '{}'", other))),
        }
    }

    fn assign_int(
        &self,
        target: &mut dyn Widget,
        name: &str,
        value: i64,
        name_tok: &Token,
    ) -> Result<(), ParseError> {
        if target.set_int(name, value) {
            Ok(())
        } else {
            Err(self.unknown_property(target, name, name_tok))
        }
    }

    fn assign_float(
        &self,
        target: &mut dyn Widget,
        name: &str,
        value: f64,
        name_tok: &Token,
    ) -> Result<(), ParseError> {
        if target.set_float(name, value) {
            Ok(())
        } else {
            Err(self.unknown_property(target, name, name_tok))
        }
    }

    fn assign_bool(
        &self,
        target: &mut dyn Widget,
        name: &str,
        value: bool,
        name_tok: &Token,
    ) -> Result<(), ParseError> {
        if target.set_bool(name, value) {
            Ok(())
        } else {
            Err(self.unknown_property(target, name, name_tok))
        }
    }

    /// A scalar property ends at `;`, at a line break, or directly before
    /// the closing `}` of its block (which stays unconsumed). EOF is
    /// treated like the `}` lookahead so the block loop reports the
    /// unclosed brace instead.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        loop {
            let tok = self.next_raw();
            match &tok.kind {
                TokenKind::Whitespace | TokenKind::Comment { .. } => continue,
                TokenKind::Error(text) => {
                    let message = format!("unrecognized character sequence '{}'", text);
                    return Err(self.error_at(ParseErrorKind::Lexical, &tok, message));
                }
                TokenKind::Semicolon | TokenKind::Eol => return Ok(()),
                TokenKind::RBrace | TokenKind::Eof => {
                    self.unread(tok);
                    return Ok(());
                }
                _ => {
                    return Err(self.syntax(
                        &tok,
                        "expected ';', a line break, or '}' after a property value",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Alignment, Registry};
    use std::any::Any;
    use std::collections::HashMap;

    /// Recording widget used across the parser tests. Accepts every
    /// property unless a whitelist was given at construction.
    #[derive(Debug, Default)]
    struct Node {
        type_name: String,
        allowed: Option<Vec<String>>,
        ints: HashMap<String, i64>,
        floats: HashMap<String, f64>,
        bools: HashMap<String, bool>,
        strings: HashMap<String, String>,
        rects: HashMap<String, RectOffset>,
        lists: HashMap<String, Vec<ListEntry>>,
        raw_string_names: Vec<String>,
        children: Vec<WidgetHandle>,
    }

    impl Node {
        fn accepts(&self, name: &str) -> bool {
            match &self.allowed {
                Some(allowed) => allowed.iter().any(|a| a == name),
                None => true,
            }
        }
    }

    impl Widget for Node {
        fn type_name(&self) -> &str {
            &self.type_name
        }
        fn set_int(&mut self, name: &str, value: i64) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.ints.insert(name.to_owned(), value);
            true
        }
        fn set_bool(&mut self, name: &str, value: bool) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.bools.insert(name.to_owned(), value);
            true
        }
        fn set_float(&mut self, name: &str, value: f64) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.floats.insert(name.to_owned(), value);
            true
        }
        fn set_string(&mut self, name: &str, value: &str) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.strings.insert(name.to_owned(), value.to_owned());
            true
        }
        fn set_raw_string(&mut self, name: &str, value: &str) -> bool {
            self.raw_string_names.push(name.to_owned());
            self.set_string(name, value)
        }
        fn set_rect(&mut self, name: &str, value: RectOffset) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.rects.insert(name.to_owned(), value);
            true
        }
        fn set_list(&mut self, name: &str, items: Vec<ListEntry>) -> bool {
            if !self.accepts(name) {
                return false;
            }
            self.lists.insert(name.to_owned(), items);
            true
        }
        fn append_child(&mut self, child: WidgetHandle) {
            self.children.push(child);
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry(types: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for t in types {
            let type_name = t.to_string();
            registry.register(type_name.clone(), move || {
                Box::new(Node {
                    type_name: type_name.clone(),
                    ..Node::default()
                }) as WidgetHandle
            });
        }
        registry
    }

    fn as_node(widget: &dyn Widget) -> &Node {
        widget.as_any().downcast_ref::<Node>().unwrap()
    }

    #[test]
    fn builds_a_nested_tree() {
        let registry = registry(&["Column", "Button"]);
        let root = parse(
            r#"Column { Button { text: "Ok" } }"#,
            "test.weft",
            &registry,
        )
        .unwrap();
        let root = as_node(root.as_ref());
        assert_eq!(root.type_name, "Column");
        assert_eq!(root.children.len(), 1);
        let button = as_node(root.children[0].as_ref());
        assert_eq!(button.type_name, "Button");
        assert_eq!(button.strings.get("text").map(String::as_str), Some("Ok"));
    }

    #[test]
    fn unknown_root_type_is_reported_by_name() {
        let registry = registry(&["Column"]);
        let err = parse("Frobnicator { }", "test.weft", &registry).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownType {
                type_name: "Frobnicator".into()
            }
        );
        assert!(err.message.contains("Frobnicator"));
    }

    #[test]
    fn unknown_nested_type_is_reported() {
        let registry = registry(&["Column"]);
        let err = parse("Column { Mystery { } }", "test.weft", &registry).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnknownType { .. }));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 10);
    }

    #[test]
    fn scalar_values_reach_the_right_setters() {
        let registry = registry(&["Panel"]);
        let root = parse(
            "Panel {\n  width: 120\n  scale: 1.5\n  visible: true\n  title: \"hi\"\n  tag: custom\n}",
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.ints.get("width"), Some(&120));
        assert_eq!(node.floats.get("scale"), Some(&1.5));
        assert_eq!(node.bools.get("visible"), Some(&true));
        assert_eq!(node.strings.get("title").map(String::as_str), Some("hi"));
        // Unrecognized keyword falls through to the string setter.
        assert_eq!(node.strings.get("tag").map(String::as_str), Some("custom"));
    }

    #[test]
    fn signed_numbers_apply_the_sign() {
        let registry = registry(&["Panel"]);
        let root = parse("Panel { x: -4; y: +2; dz: -0.5 }", "test.weft", &registry).unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.ints.get("x"), Some(&-4));
        assert_eq!(node.ints.get("y"), Some(&2));
        assert_eq!(node.floats.get("dz"), Some(&-0.5));
    }

    struct DoubleUnits;
    impl UnitResolver for DoubleUnits {
        fn point_size(&self, raw: i64) -> i64 {
            raw * 2
        }
        fn percent_size(&self, raw: i64) -> i64 {
            raw * 3
        }
    }

    #[test]
    fn unit_suffixes_route_through_the_resolver() {
        let registry = registry(&["Panel"]);
        let parser = Parser::with_units(&registry, &DoubleUnits);
        let root = parser
            .parse(
                "Panel { a: 10px; b: 10pt; c: 10em; d: 10m; e: 50% }",
                "test.weft",
            )
            .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.ints.get("a"), Some(&10)); // px is identity
        assert_eq!(node.ints.get("b"), Some(&20));
        assert_eq!(node.ints.get("c"), Some(&20));
        assert_eq!(node.ints.get("d"), Some(&20));
        assert_eq!(node.ints.get("e"), Some(&150));
    }

    #[test]
    fn unknown_unit_suffix_is_a_syntax_error() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel { a: 10zz }", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("zz"));
    }

    #[test]
    fn alignment_and_orientation_keywords() {
        let registry = registry(&["Panel"]);
        let root = parse(
            "Panel { align: center; orientation: vertical; flow: horizontal }",
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.ints.get("align"), Some(&(Alignment::Center as i64)));
        assert_eq!(
            node.ints.get("orientation"),
            Some(&(Orientation::Vertical as i64))
        );
        // Outside the orientation property the keyword is a plain string.
        assert_eq!(
            node.strings.get("flow").map(String::as_str),
            Some("horizontal")
        );
    }

    #[test]
    fn id_properties_bypass_string_conversion() {
        let registry = registry(&["Panel"]);
        let root = parse(
            r#"Panel { id: "root"; styleID: "dark"; backgroundImageID: "bg"; title: "x" }"#,
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(
            node.raw_string_names,
            vec!["id", "styleID", "backgroundImageID"]
        );
        assert_eq!(node.strings.get("title").map(String::as_str), Some("x"));
    }

    #[test]
    fn rect_positional_and_named_forms_agree() {
        let registry = registry(&["Panel"]);
        let positional = parse(
            "Panel { margin: Rect { 1, 2, 3, 4 } }",
            "test.weft",
            &registry,
        )
        .unwrap();
        let named = parse(
            "Panel { margin: Rect { left: 1; top: 2; right: 3; bottom: 4 } }",
            "test.weft",
            &registry,
        )
        .unwrap();
        let expected = RectOffset::new(1, 2, 3, 4);
        assert_eq!(
            as_node(positional.as_ref()).rects.get("margin"),
            Some(&expected)
        );
        assert_eq!(as_node(named.as_ref()).rects.get("margin"), Some(&expected));
    }

    #[test]
    fn rect_mixing_positional_and_named_is_accepted() {
        let registry = registry(&["Panel"]);
        let root = parse(
            "Panel { margin: Rect { 1, 2, bottom: 9 } }",
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.rects.get("margin"), Some(&RectOffset::new(1, 2, 0, 9)));
    }

    #[test]
    fn rect_with_too_many_values_fails() {
        let registry = registry(&["Panel"]);
        let err = parse(
            "Panel { margin: Rect { 1, 2, 3, 4, 5 } }",
            "test.weft",
            &registry,
        )
        .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("Rect"));
    }

    #[test]
    fn rect_units_are_resolved() {
        let registry = registry(&["Panel"]);
        let parser = Parser::with_units(&registry, &DoubleUnits);
        let root = parser
            .parse("Panel { margin: Rect { 1pt, 2, 50%, 4px } }", "test.weft")
            .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(
            node.rects.get("margin"),
            Some(&RectOffset::new(2, 2, 150, 4))
        );
    }

    #[test]
    fn list_values_carry_ids_and_labels() {
        let registry = registry(&["Menu"]);
        let root = parse(
            r#"Menu { entries: [1, open, "Save As"] }"#,
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        let entries = node.lists.get("entries").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].int_id, Some(1));
        assert_eq!(entries[0].label, "1");
        assert_eq!(entries[1].str_id.as_deref(), Some("open"));
        assert_eq!(entries[2].label, "Save As");
    }

    #[test]
    fn list_rejects_unit_suffixes() {
        let registry = registry(&["Menu"]);
        let err = parse("Menu { entries: [10px] }", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn terminators_semicolon_newline_and_brace() {
        let registry = registry(&["Panel"]);
        // Semicolon, newline, and immediate '}' all validly end a property.
        assert!(parse("Panel { a: 1; b: 2 }", "test.weft", &registry).is_ok());
        assert!(parse("Panel {\n a: 1\n b: 2\n}", "test.weft", &registry).is_ok());
        assert!(parse("Panel { a: 1 }", "test.weft", &registry).is_ok());
    }

    #[test]
    fn missing_terminator_is_a_syntax_error() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel { a: 1 b: 2 }", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("';'"));
    }

    #[test]
    fn unknown_property_names_type_and_property() {
        let mut registry = Registry::new();
        registry.register("Strict", || {
            Box::new(Node {
                type_name: "Strict".into(),
                allowed: Some(vec!["width".into()]),
                ..Node::default()
            }) as WidgetHandle
        });
        let err = parse("Strict { height: 2 }", "test.weft", &registry).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownProperty {
                type_name: "Strict".into(),
                property: "height".into()
            }
        );
    }

    #[test]
    fn trailing_content_after_root_is_rejected() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel { } Panel { }", "test.weft", &registry).unwrap_err();
        assert!(err.message.contains("end of file expected"));
    }

    #[test]
    fn sibling_braces_with_context_are_rejected() {
        let registry = registry(&[]);
        let parser = Parser::new(&registry);
        let mut context = Node {
            type_name: "Root".into(),
            ..Node::default()
        };
        let err = parser
            .parse_into("{ } { }", "test.weft", &mut context)
            .unwrap_err();
        assert!(err.message.contains("end of file expected"));
    }

    #[test]
    fn context_parse_populates_the_supplied_root() {
        let registry = registry(&["Button"]);
        let parser = Parser::new(&registry);
        let mut context = Node {
            type_name: "Root".into(),
            ..Node::default()
        };
        parser
            .parse_into(
                "{ title: \"win\"\n Button { text: \"Ok\" } }",
                "test.weft",
                &mut context,
            )
            .unwrap();
        assert_eq!(
            context.strings.get("title").map(String::as_str),
            Some("win")
        );
        assert_eq!(context.children.len(), 1);
    }

    #[test]
    fn context_plus_root_type_is_a_redefinition_error() {
        let registry = registry(&["Foo"]);
        let parser = Parser::new(&registry);
        let mut context = Node {
            type_name: "Root".into(),
            ..Node::default()
        };
        let err = parser
            .parse_into("Foo { }", "test.weft", &mut context)
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("context"));
        // The context must be untouched.
        assert!(context.strings.is_empty());
        assert!(context.children.is_empty());
    }

    #[test]
    fn top_level_brace_without_context_is_rejected() {
        let registry = registry(&["Panel"]);
        let err = parse("{ }", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn lexical_error_tokens_are_fatal() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel { a: 10PX }", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
    }

    #[test]
    fn unclosed_block_reports_eof() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel { a: 1", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("end of file"));
    }

    #[test]
    fn empty_source_is_an_error() {
        let registry = registry(&[]);
        let err = parse("", "test.weft", &registry).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn errors_carry_position_and_snippet() {
        let registry = registry(&["Panel"]);
        let err = parse("Panel {\n  a: 10zz\n}", "test.weft", &registry).unwrap_err();
        assert_eq!(err.file, "test.weft");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 6);
        let snippet = err.snippet.as_deref().unwrap();
        assert!(snippet.contains("a: 10zz"));
        assert!(snippet.contains("^^^"));
    }

    #[test]
    fn comments_are_ignored_by_the_grammar() {
        let registry = registry(&["Panel"]);
        let root = parse(
            "// header\nPanel { /* inline */ a: 1 // tail\n  b: 2\n}",
            "test.weft",
            &registry,
        )
        .unwrap();
        let node = as_node(root.as_ref());
        assert_eq!(node.ints.get("a"), Some(&1));
        assert_eq!(node.ints.get("b"), Some(&2));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        // 2000 nested blocks would overflow a call-recursive parser.
        let registry = registry(&["Box"]);
        let mut src = String::new();
        for _ in 0..2000 {
            src.push_str("Box { ");
        }
        src.push_str("depth: 1 ");
        for _ in 0..2000 {
            src.push('}');
        }
        assert!(parse(&src, "deep.weft", &registry).is_ok());
    }
}
