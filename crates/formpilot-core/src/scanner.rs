//! Candidate field extraction.
//!
//! [`FormScanner::scan`] is a tolerant pattern match over raw markup, not a
//! parser: it finds `input`, `textarea` and `select` opening tags and reads
//! their attributes. [`FormScanner::locate`] then binds each descriptor to
//! the live page and drops fields the user could not interact with.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use formpilot_protocols::{
    ElementHandle, FieldDescriptor, FieldIdentifier, FieldModality, PageAccessor, PageError,
};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(input|textarea|select)\b([^>]*)>").expect("tag pattern is valid")
});

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Why a scanned field was not filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    Hidden,
    Disabled,
    Lookup(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found on page"),
            Self::Hidden => f.write_str("not visible"),
            Self::Disabled => f.write_str("disabled"),
            Self::Lookup(e) => write!(f, "lookup failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedField {
    pub descriptor: FieldDescriptor,
    pub reason: SkipReason,
}

/// A descriptor bound to its element on the live page.
#[derive(Clone)]
pub struct LocatedField {
    pub descriptor: FieldDescriptor,
    pub element: ElementHandle,
}

/// Result of binding scanned descriptors to the page.
#[derive(Default)]
pub struct ScanOutcome {
    /// Fillable fields, in document order.
    pub fields: Vec<LocatedField>,
    pub skipped: Vec<SkippedField>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormScanner;

impl FormScanner {
    pub fn new() -> Self {
        Self
    }

    /// Extract field descriptors from markup, in document order.
    ///
    /// File uploads, hidden inputs and buttons are dropped, as are elements
    /// with neither id nor name. Radios sharing a name yield one descriptor.
    pub fn scan(&self, markup: &str) -> Vec<FieldDescriptor> {
        let mut descriptors = Vec::new();
        let mut seen_groups = HashSet::new();

        for captures in TAG_PATTERN.captures_iter(markup) {
            let fragment = &captures[0];
            let tag = captures[1].to_ascii_lowercase();
            let attributes = parse_attributes(&captures[2]);
            let input_type = attributes.get("type").map(String::as_str);

            let Some(modality) = FieldModality::from_tag(&tag, input_type) else {
                debug!("Skipping {}: not fillable", fragment);
                continue;
            };

            let id = attributes.get("id").map(String::as_str);
            let name = attributes.get("name").map(String::as_str);
            let identifier = FieldIdentifier::from_attributes(id, name);
            if !identifier.is_addressable() {
                debug!("Skipping {}: no id or name", fragment);
                continue;
            }

            let mut descriptor = FieldDescriptor::new(modality, identifier, fragment);
            if modality == FieldModality::RadioGroup {
                let group = name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .or(id.map(str::trim))
                    .unwrap_or_default()
                    .to_string();
                if !seen_groups.insert(group.clone()) {
                    continue;
                }
                // Radios are addressed through their group.
                if name.is_some_and(|n| !n.trim().is_empty()) {
                    descriptor.identifier = FieldIdentifier::Name(group.clone());
                }
                descriptor = descriptor.with_group(group);
            }
            descriptors.push(descriptor);
        }

        descriptors
    }

    /// Bind descriptors to live elements, skipping those that are missing,
    /// hidden or disabled. Every skip is logged.
    pub async fn locate(&self, page: &dyn PageAccessor, descriptors: Vec<FieldDescriptor>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for descriptor in descriptors {
            match locate_one(page, &descriptor).await {
                Ok(element) => outcome.fields.push(LocatedField { descriptor, element }),
                Err(reason) => {
                    warn!("Skipping field {}: {}", descriptor.identifier, reason);
                    outcome.skipped.push(SkippedField { descriptor, reason });
                }
            }
        }

        outcome
    }
}

async fn locate_one(page: &dyn PageAccessor, descriptor: &FieldDescriptor) -> Result<ElementHandle, SkipReason> {
    let element = find(page, descriptor)
        .await
        .map_err(|e| SkipReason::Lookup(e.to_string()))?
        .ok_or(SkipReason::NotFound)?;

    let displayed = element
        .is_displayed()
        .await
        .map_err(|e| SkipReason::Lookup(e.to_string()))?;
    if !displayed {
        return Err(SkipReason::Hidden);
    }
    let enabled = element
        .is_enabled()
        .await
        .map_err(|e| SkipReason::Lookup(e.to_string()))?;
    if !enabled {
        return Err(SkipReason::Disabled);
    }
    Ok(element)
}

async fn find(page: &dyn PageAccessor, descriptor: &FieldDescriptor) -> Result<Option<ElementHandle>, PageError> {
    match &descriptor.identifier {
        FieldIdentifier::Id(id) => page.find_by_id(id).await,
        FieldIdentifier::Name(name) => Ok(page.find_by_name(name).await?.into_iter().next()),
        FieldIdentifier::Unnamed => Ok(None),
    }
}

/// Attributes of an opening tag, names lowercased. Boolean attributes map to
/// an empty string. The first occurrence of a name wins.
fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for captures in ATTR_PATTERN.captures_iter(raw) {
        let name = captures[1].to_ascii_lowercase();
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        attributes.entry(name).or_insert(value);
    }
    attributes
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
