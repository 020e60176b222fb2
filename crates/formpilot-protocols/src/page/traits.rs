//! Page accessor and element traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PageError;

/// Shared handle to an element of the live page.
pub type ElementHandle = Arc<dyn PageElement>;

/// Structural relation from a field to another element, used to find the
/// field's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `<label for="...">` naming the field's id.
    AssociatedLabel,
    /// A `<label>` that contains the field.
    AncestorLabel,
    /// The nearest `<label>` before the field in document order.
    PrecedingLabel,
    /// The nearest preceding sibling that is a `<label>` or has a class
    /// containing "label".
    PrecedingSiblingLabel,
}

/// Access to the page in the active browser tab.
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Find the element with the given id.
    async fn find_by_id(&self, id: &str) -> Result<Option<ElementHandle>, PageError>;

    /// Find all elements with the given name, in document order.
    async fn find_by_name(&self, name: &str) -> Result<Vec<ElementHandle>, PageError>;

    /// The element that currently has focus, if any element other than the
    /// document body does.
    async fn active_element(&self) -> Result<Option<ElementHandle>, PageError>;

    /// Markup of the document body.
    async fn body_markup(&self) -> Result<String, PageError>;
}

/// A single element of the live page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Lowercase tag name (`input`, `select`, ...).
    async fn tag_name(&self) -> Result<String, PageError>;

    /// Attribute value, `None` when the attribute is absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError>;

    /// Current value as displayed to the user (the `value` property).
    async fn value(&self) -> Result<String, PageError>;

    /// Visible text content.
    async fn text(&self) -> Result<String, PageError>;

    async fn is_displayed(&self) -> Result<bool, PageError>;

    async fn is_enabled(&self) -> Result<bool, PageError>;

    /// Checked state for checkboxes and radios, selected state for options.
    async fn is_selected(&self) -> Result<bool, PageError>;

    async fn clear(&self) -> Result<(), PageError>;

    async fn set_value(&self, text: &str) -> Result<(), PageError>;

    async fn click(&self) -> Result<(), PageError>;

    /// Visible texts of a select element's options, in order.
    async fn options(&self) -> Result<Vec<String>, PageError>;

    /// Select the option at `index` of a select element.
    async fn select_option(&self, index: usize) -> Result<(), PageError>;

    /// Element reached from this one through `relation`.
    async fn related(&self, relation: Relation) -> Result<Option<ElementHandle>, PageError>;

    /// The `<form>` enclosing this element.
    async fn ancestor_form(&self) -> Result<Option<ElementHandle>, PageError>;

    /// Outer markup of this element.
    async fn outer_markup(&self) -> Result<String, PageError>;
}
