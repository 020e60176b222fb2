//! Committing generated answers to fields.
//!
//! Text fields take the response verbatim. Selects and radio groups pick the
//! choice with the smallest edit distance to the response. Checkboxes accept
//! a small yes/no vocabulary and are clicked only when the state must change.

use tracing::{debug, info};

use formpilot_protocols::{FieldModality, PageAccessor, PageElement};

use crate::edit_distance::{closest, distance, normalize};
use crate::error::ApplyError;
use crate::field::ResolvedField;
use crate::label::LabelResolver;

const TRUTHY: [&str; 4] = ["yes", "true", "1", "on"];
const FALSY: [&str; 4] = ["no", "false", "0", "off"];

/// What was done to the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedValue {
    Text(String),
    Option { index: usize, text: String },
    Checkbox { checked: bool, clicked: bool },
    Radio { index: usize, value: String, score: usize },
}

/// Map a checkbox response onto a checked state.
pub fn parse_checkbox(response: &str) -> Option<bool> {
    let normalized = normalize(response);
    if TRUTHY.contains(&normalized.as_str()) {
        Some(true)
    } else if FALSY.contains(&normalized.as_str()) {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldValueApplier {
    labels: LabelResolver,
}

impl FieldValueApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `response` to `field`, dispatching on its modality.
    pub async fn apply(
        &self,
        page: &dyn PageAccessor,
        field: &ResolvedField,
        response: &str,
    ) -> Result<AppliedValue, ApplyError> {
        let element = field.element.as_ref();
        match field.modality() {
            FieldModality::Text | FieldModality::Textarea => {
                self.apply_text(element, response).await
            }
            FieldModality::Select => self.apply_select(element, &field.label, response).await,
            FieldModality::Checkbox => self.apply_checkbox(element, response).await,
            FieldModality::RadioGroup => {
                let group = field.radio_group().unwrap_or(field.label.as_str());
                self.apply_radio(page, group, response).await
            }
        }
    }

    async fn apply_text(
        &self,
        element: &dyn PageElement,
        response: &str,
    ) -> Result<AppliedValue, ApplyError> {
        element.clear().await?;
        element.set_value(response).await?;
        Ok(AppliedValue::Text(response.to_string()))
    }

    async fn apply_select(
        &self,
        element: &dyn PageElement,
        label: &str,
        response: &str,
    ) -> Result<AppliedValue, ApplyError> {
        let options = element.options().await?;
        let target = normalize(response);
        let normalized: Vec<String> = options.iter().map(|o| normalize(o)).collect();
        let (index, d) = closest(&target, normalized.iter().map(String::as_str))
            .ok_or_else(|| ApplyError::NoOptions(label.to_string()))?;

        debug!("Select {:?}: {:?} matched option {} (distance {})", label, response, index, d);
        element.select_option(index).await?;
        Ok(AppliedValue::Option {
            index,
            text: options[index].clone(),
        })
    }

    async fn apply_checkbox(
        &self,
        element: &dyn PageElement,
        response: &str,
    ) -> Result<AppliedValue, ApplyError> {
        let desired = parse_checkbox(response)
            .ok_or_else(|| ApplyError::InvalidCheckboxResponse(response.to_string()))?;
        let current = element.is_selected().await?;
        let clicked = current != desired;
        if clicked {
            element.click().await?;
        }
        Ok(AppliedValue::Checkbox {
            checked: desired,
            clicked,
        })
    }

    async fn apply_radio(
        &self,
        page: &dyn PageAccessor,
        group: &str,
        response: &str,
    ) -> Result<AppliedValue, ApplyError> {
        let mut radios = Vec::new();
        for element in page.find_by_name(group).await? {
            let input_type = element.attribute("type").await?;
            if input_type.is_some_and(|t| t.eq_ignore_ascii_case("radio")) {
                radios.push(element);
            }
        }
        if radios.is_empty() {
            return Err(ApplyError::NoRadiosFound(group.to_string()));
        }

        let target = normalize(response);
        let mut best: Option<(usize, usize, String)> = None;
        for (index, radio) in radios.iter().enumerate() {
            let value = radio.attribute("value").await?.unwrap_or_default();
            let label = self.labels.resolve(radio.as_ref()).await;
            let score = distance(&normalize(&value), &target).min(distance(&normalize(&label), &target));
            debug!("Radio {}[{}] value={:?} label={:?} score={}", group, index, value, label, score);
            if best.as_ref().is_none_or(|(_, best_score, _)| score < *best_score) {
                best = Some((index, score, value));
            }
        }

        // Non-empty group, so a best radio exists.
        let Some((index, score, value)) = best else {
            return Err(ApplyError::NoRadiosFound(group.to_string()));
        };
        let radio = &radios[index];
        if !radio.is_selected().await? {
            radio.click().await?;
        }
        info!("Selected radio {:?} in group {}", value, group);
        Ok(AppliedValue::Radio { index, value, score })
    }
}

#[cfg(test)]
#[path = "applier_tests.rs"]
mod tests;
