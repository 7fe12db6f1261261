//! Collaborator seams: the object model the parser populates, the registry
//! it resolves type names through, and the unit-resolution hooks.
//!
//! The parser never sees a concrete widget type. It creates instances
//! through [`WidgetFactory`], assigns values through the typed setters on
//! [`Widget`], and attaches children with `append_child`. Each setter
//! returns whether the property name was recognized; `false` sends the
//! parser down its unknown-property error path.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An owned widget-tree node. Once appended to a parent the child is owned
/// by that parent exactly once: the result is a tree, not a graph.
pub type WidgetHandle = Box<dyn Widget>;

/// Factory closure stored in a [`Registry`].
pub type FactoryFn = Box<dyn Fn() -> WidgetHandle + Send + Sync>;

/// The four-integer rectangle-offset quad produced by a `Rect { ... }`
/// block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectOffset {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl RectOffset {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        RectOffset {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// One entry of a `[...]` list value. Integer items populate `int_id`,
/// identifier and string items populate `str_id`; `label` is always the
/// display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub int_id: Option<i64>,
    pub str_id: Option<String>,
    pub label: String,
}

impl ListEntry {
    pub fn from_int(value: i64) -> Self {
        ListEntry {
            int_id: Some(value),
            str_id: None,
            label: value.to_string(),
        }
    }

    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        ListEntry {
            int_id: None,
            str_id: Some(label.clone()),
            label,
        }
    }
}

/// Alignment constants the parser assigns for the alignment keywords
/// (`align: center` becomes `set_int("align", Alignment::Center as i64)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
    HCenter = 4,
    VCenter = 5,
    Center = 6,
    TopLeft = 7,
}

/// Maps an alignment keyword to its constant. `None` for any other word.
pub fn alignment_keyword(word: &str) -> Option<Alignment> {
    match word {
        "left" => Some(Alignment::Left),
        "right" => Some(Alignment::Right),
        "top" => Some(Alignment::Top),
        "bottom" => Some(Alignment::Bottom),
        "hcenter" => Some(Alignment::HCenter),
        "vcenter" => Some(Alignment::VCenter),
        "center" => Some(Alignment::Center),
        "topleft" => Some(Alignment::TopLeft),
        _ => None,
    }
}

/// Orientation constants for `orientation: vertical | horizontal`. The
/// keywords only carry this meaning when the property is named
/// `orientation`; elsewhere they are plain identifier values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Horizontal = 0,
    Vertical = 1,
}

/// The object-model side of the parser contract.
///
/// Setters return `true` when the property name was recognized. A `false`
/// return aborts the parse with an unknown-property error, so a widget
/// that wants to ignore a property should return `true` and drop the
/// value.
pub trait Widget: std::fmt::Debug {
    /// The registry type name this instance was created under. Used in
    /// unknown-property diagnostics.
    fn type_name(&self) -> &str;

    fn set_int(&mut self, name: &str, value: i64) -> bool;
    fn set_bool(&mut self, name: &str, value: bool) -> bool;
    fn set_float(&mut self, name: &str, value: f64) -> bool;

    /// String assignment. Implementations may interpret the value (resolve
    /// a resource name, look up another object); the parser routes
    /// `id`, `styleID`, and `backgroundImageID` through
    /// [`set_raw_string`](Widget::set_raw_string) instead so those always
    /// land verbatim.
    fn set_string(&mut self, name: &str, value: &str) -> bool;

    /// Verbatim string assignment, bypassing any richer conversion
    /// `set_string` might do. Defaults to plain `set_string`.
    fn set_raw_string(&mut self, name: &str, value: &str) -> bool {
        self.set_string(name, value)
    }

    fn set_rect(&mut self, name: &str, value: RectOffset) -> bool;
    fn set_list(&mut self, name: &str, items: Vec<ListEntry>) -> bool;

    /// Attach a finished child node. Ownership transfers to the parent.
    fn append_child(&mut self, child: WidgetHandle);

    /// Downcasting hook so callers can recover their concrete types from a
    /// finished tree.
    fn as_any(&self) -> &dyn Any;
}

/// Resolves a type name to a "create empty instance" factory.
///
/// Queried for the optional root type and for every nested object block.
/// Must be fully populated before a parse begins and is only read during
/// one; concurrent parses over one factory are fine as long as nobody
/// mutates it.
pub trait WidgetFactory {
    fn create(&self, type_name: &str) -> Option<WidgetHandle>;
}

/// Map-backed [`WidgetFactory`].
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, FactoryFn>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> WidgetHandle + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Box::new(factory));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl WidgetFactory for Registry {
    fn create(&self, type_name: &str) -> Option<WidgetHandle> {
        self.factories.get(type_name).map(|factory| factory())
    }
}

/// Unit-conversion policy for numeric literals with a suffix. A bare
/// integer (or `px`) is taken as-is; `pt`, `em`, and `m` go through
/// [`point_size`](UnitResolver::point_size); `%` goes through
/// [`percent_size`](UnitResolver::percent_size).
pub trait UnitResolver {
    fn point_size(&self, raw: i64) -> i64;
    fn percent_size(&self, raw: i64) -> i64;
}

/// Identity conversion for every unit. The default when the caller does
/// not inject a policy.
pub struct IdentityUnits;

impl UnitResolver for IdentityUnits {
    fn point_size(&self, raw: i64) -> i64 {
        raw
    }

    fn percent_size(&self, raw: i64) -> i64 {
        raw
    }
}
