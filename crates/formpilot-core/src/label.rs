//! Field label resolution.
//!
//! A label is found by trying strategies in a fixed order and taking the
//! first non-empty result:
//!
//! 1. `<label for=...>` naming the field's id
//! 2. an enclosing `<label>`
//! 3. the nearest preceding `<label>` in document order
//! 4. the nearest preceding sibling that looks like a label
//! 5. `aria-label`
//! 6. `placeholder`
//! 7. `name`
//!
//! If every strategy comes up empty the label is [`UNKNOWN_FIELD`].

use std::fmt;

use tracing::debug;

use formpilot_protocols::{PageElement, PageError, Relation};

/// Label used when no strategy yields text.
pub const UNKNOWN_FIELD: &str = "Unknown field";

/// Which strategy produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    AssociatedLabel,
    AncestorLabel,
    PrecedingLabel,
    PrecedingSibling,
    AriaLabel,
    Placeholder,
    Name,
    Fallback,
}

impl LabelSource {
    /// Strategies in priority order.
    const ORDER: [LabelSource; 7] = [
        Self::AssociatedLabel,
        Self::AncestorLabel,
        Self::PrecedingLabel,
        Self::PrecedingSibling,
        Self::AriaLabel,
        Self::Placeholder,
        Self::Name,
    ];
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AssociatedLabel => "label[for]",
            Self::AncestorLabel => "ancestor label",
            Self::PrecedingLabel => "preceding label",
            Self::PrecedingSibling => "preceding sibling",
            Self::AriaLabel => "aria-label",
            Self::Placeholder => "placeholder",
            Self::Name => "name",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub text: String,
    pub source: LabelSource,
}

/// Finds a human-readable label for a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelResolver;

impl LabelResolver {
    pub fn new() -> Self {
        Self
    }

    /// The field's label. Never empty.
    pub async fn resolve(&self, field: &dyn PageElement) -> String {
        self.resolve_with_source(field).await.text
    }

    /// The field's label together with the strategy that found it.
    ///
    /// Page errors inside a strategy count as "no result" for that strategy.
    pub async fn resolve_with_source(&self, field: &dyn PageElement) -> ResolvedLabel {
        for source in LabelSource::ORDER {
            match self.try_strategy(field, source).await {
                Ok(Some(text)) => {
                    debug!("Label {:?} found via {}", text, source);
                    return ResolvedLabel { text, source };
                }
                Ok(None) => {}
                Err(e) => debug!("Label strategy {} failed: {}", source, e),
            }
        }

        ResolvedLabel {
            text: UNKNOWN_FIELD.to_string(),
            source: LabelSource::Fallback,
        }
    }

    async fn try_strategy(
        &self,
        field: &dyn PageElement,
        source: LabelSource,
    ) -> Result<Option<String>, PageError> {
        let text = match source {
            LabelSource::AssociatedLabel => {
                // Only meaningful when the field has an id to point at.
                let has_id = field
                    .attribute("id")
                    .await?
                    .is_some_and(|id| !id.trim().is_empty());
                if !has_id {
                    return Ok(None);
                }
                related_text(field, Relation::AssociatedLabel).await?
            }
            LabelSource::AncestorLabel => related_text(field, Relation::AncestorLabel).await?,
            LabelSource::PrecedingLabel => related_text(field, Relation::PrecedingLabel).await?,
            LabelSource::PrecedingSibling => {
                related_text(field, Relation::PrecedingSiblingLabel).await?
            }
            LabelSource::AriaLabel => field.attribute("aria-label").await?,
            LabelSource::Placeholder => field.attribute("placeholder").await?,
            LabelSource::Name => field.attribute("name").await?,
            LabelSource::Fallback => None,
        };

        Ok(text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }
}

async fn related_text(
    field: &dyn PageElement,
    relation: Relation,
) -> Result<Option<String>, PageError> {
    match field.related(relation).await? {
        Some(element) => Ok(Some(element.text().await?)),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "label_tests.rs"]
mod tests;
