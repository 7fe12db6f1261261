//! weft-core: compiler core for the Weft declarative markup language.
//!
//! Weft markup describes a tree of named widget blocks with typed property
//! assignments:
//!
//! ```text
//! Column {
//!     spacing: 8
//!     margin: Rect { 4, 4, 4, 4 }
//!     Button { text: "Ok"; align: center }
//! }
//! ```
//!
//! This crate turns such text into an in-memory object tree. It knows
//! nothing about rendering, layout, or styling; widgets are opaque handles
//! behind the [`Widget`] trait, created through a [`WidgetFactory`] the
//! caller injects. Parsing is synchronous and runs to completion on the
//! calling thread.
//!
//! # Modules
//!
//! - [`lexer`] -- character-level tokenizer ([`Tokenizer`], [`Token`],
//!   [`tokenize()`])
//! - [`parser`] -- recursive-descent parser ([`Parser`], [`parse()`])
//! - [`widget`] -- collaborator traits and value types ([`Widget`],
//!   [`Registry`], [`RectOffset`], [`ListEntry`])
//! - [`error`] -- diagnostics ([`ParseError`], [`ParseErrorKind`])
//!
//! # Quick start
//!
//! ```rust
//! use std::any::Any;
//! use weft_core::{parse, ListEntry, RectOffset, Registry, Widget, WidgetHandle};
//!
//! #[derive(Debug, Default)]
//! struct Label {
//!     text: String,
//!     children: Vec<WidgetHandle>,
//! }
//!
//! impl Widget for Label {
//!     fn type_name(&self) -> &str {
//!         "Label"
//!     }
//!     fn set_int(&mut self, _: &str, _: i64) -> bool {
//!         false
//!     }
//!     fn set_bool(&mut self, _: &str, _: bool) -> bool {
//!         false
//!     }
//!     fn set_float(&mut self, _: &str, _: f64) -> bool {
//!         false
//!     }
//!     fn set_string(&mut self, name: &str, value: &str) -> bool {
//!         if name == "text" {
//!             self.text = value.to_owned();
//!             return true;
//!         }
//!         false
//!     }
//!     fn set_rect(&mut self, _: &str, _: RectOffset) -> bool {
//!         false
//!     }
//!     fn set_list(&mut self, _: &str, _: Vec<ListEntry>) -> bool {
//!         false
//!     }
//!     fn append_child(&mut self, child: WidgetHandle) {
//!         self.children.push(child);
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("Label", || Box::new(Label::default()) as WidgetHandle);
//!
//! let root = parse(r#"Label { text: "hello" }"#, "hello.weft", &registry).unwrap();
//! let label = root.as_any().downcast_ref::<Label>().unwrap();
//! assert_eq!(label.text, "hello");
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod widget;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{source_snippet, ParseError, ParseErrorKind};
pub use lexer::{tokenize, Token, TokenKind, Tokenizer};
pub use parser::{parse, Parser};
pub use widget::{
    alignment_keyword, Alignment, FactoryFn, IdentityUnits, ListEntry, Orientation, RectOffset,
    Registry, UnitResolver, Widget, WidgetFactory, WidgetHandle,
};
