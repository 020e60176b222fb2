//! Fields bound to live page elements.

use formpilot_protocols::{ElementHandle, FieldDescriptor, FieldIdentifier, FieldModality, PageElement};

use crate::error::FillError;

/// A field descriptor together with its resolved label and a handle to the
/// element on the page. For radio groups the handle is the first radio.
#[derive(Clone)]
pub struct ResolvedField {
    pub descriptor: FieldDescriptor,
    pub label: String,
    pub element: ElementHandle,
}

impl ResolvedField {
    pub fn new(descriptor: FieldDescriptor, label: impl Into<String>, element: ElementHandle) -> Self {
        Self {
            descriptor,
            label: label.into(),
            element,
        }
    }

    pub fn modality(&self) -> FieldModality {
        self.descriptor.modality
    }

    /// Name shared by the radios of this field's group.
    pub fn radio_group(&self) -> Option<&str> {
        self.descriptor.group.as_deref().or(match &self.descriptor.identifier {
            FieldIdentifier::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl std::fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedField")
            .field("descriptor", &self.descriptor)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Describe a live element, typically the focused one.
///
/// Elements that cannot take an answer (buttons, file uploads, non-form
/// elements) are [`FillError::Unsupported`].
pub async fn describe_element(element: &dyn PageElement) -> Result<FieldDescriptor, FillError> {
    let tag = element.tag_name().await?.to_ascii_lowercase();
    let input_type = element.attribute("type").await?;
    let modality = FieldModality::from_tag(&tag, input_type.as_deref()).ok_or_else(|| {
        match &input_type {
            Some(t) => FillError::Unsupported(format!("<{} type=\"{}\">", tag, t)),
            None => FillError::Unsupported(format!("<{}>", tag)),
        }
    })?;

    let id = element.attribute("id").await?;
    let name = element.attribute("name").await?;
    let identifier = FieldIdentifier::from_attributes(id.as_deref(), name.as_deref());
    let markup = element.outer_markup().await.unwrap_or_default();

    let mut descriptor = FieldDescriptor::new(modality, identifier, markup);
    if modality == FieldModality::RadioGroup {
        if let Some(group) = name.filter(|n| !n.trim().is_empty()) {
            descriptor = descriptor.with_group(group);
        }
    }
    Ok(descriptor)
}
