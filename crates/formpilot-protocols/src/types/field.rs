//! Form field descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// UI type of a field, which decides how a generated response is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldModality {
    Text,
    Textarea,
    Select,
    Checkbox,
    RadioGroup,
}

impl FieldModality {
    /// Modality of an element given its tag name and `type` attribute.
    ///
    /// Returns `None` for controls that cannot take a typed answer
    /// (buttons, hidden inputs, file uploads).
    pub fn from_tag(tag: &str, input_type: Option<&str>) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "textarea" => Some(Self::Textarea),
            "select" => Some(Self::Select),
            "input" => {
                let input_type = input_type.unwrap_or("text").trim().to_ascii_lowercase();
                match input_type.as_str() {
                    "checkbox" => Some(Self::Checkbox),
                    "radio" => Some(Self::RadioGroup),
                    "file" | "hidden" | "submit" | "button" | "reset" | "image" => None,
                    _ => Some(Self::Text),
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::RadioGroup => "radio group",
        };
        f.write_str(name)
    }
}

/// How a field is addressed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldIdentifier {
    Id(String),
    Name(String),
    /// A focused field carrying neither id nor name.
    Unnamed,
}

impl FieldIdentifier {
    /// Prefer the id, fall back to the name. Empty strings count as absent.
    pub fn from_attributes(id: Option<&str>, name: Option<&str>) -> Self {
        match (non_empty(id), non_empty(name)) {
            (Some(id), _) => Self::Id(id.to_string()),
            (None, Some(name)) => Self::Name(name.to_string()),
            (None, None) => Self::Unnamed,
        }
    }

    pub fn is_addressable(&self) -> bool {
        !matches!(self, Self::Unnamed)
    }
}

impl fmt::Display for FieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id=\"{}\"", id),
            Self::Name(name) => write!(f, "name=\"{}\"", name),
            Self::Unnamed => f.write_str("(unnamed)"),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A candidate field found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub modality: FieldModality,
    pub identifier: FieldIdentifier,
    /// Radio group name. Radios are addressed by group, not by option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// The tag as it appeared in the scanned markup.
    pub markup: String,
}

impl FieldDescriptor {
    pub fn new(modality: FieldModality, identifier: FieldIdentifier, markup: impl Into<String>) -> Self {
        Self {
            modality,
            identifier,
            group: None,
            markup: markup.into(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[cfg(test)]
#[path = "field_tests.rs"]
mod tests;
