//! In-memory page and scripted backend for engine tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use formpilot_protocols::{
    BackendError, ElementHandle, GenerationConfig, GenerationRequest, ModelBackend,
    PageAccessor, PageElement, PageError, Relation,
};

/// A fake element. Built with the chained setters, then shared via `Arc`.
pub struct FakeElement {
    tag: String,
    attributes: HashMap<String, String>,
    text: String,
    value: Mutex<String>,
    displayed: bool,
    enabled: bool,
    selected: AtomicBool,
    options: Vec<String>,
    selected_option: Mutex<Option<usize>>,
    relations: HashMap<RelationKey, Arc<FakeElement>>,
    form_markup: Option<String>,
    failing: bool,
    clicks: AtomicUsize,
    clears: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RelationKey {
    Associated,
    Ancestor,
    Preceding,
    Sibling,
}

impl From<Relation> for RelationKey {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::AssociatedLabel => Self::Associated,
            Relation::AncestorLabel => Self::Ancestor,
            Relation::PrecedingLabel => Self::Preceding,
            Relation::PrecedingSiblingLabel => Self::Sibling,
        }
    }
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: HashMap::new(),
            text: String::new(),
            value: Mutex::new(String::new()),
            displayed: true,
            enabled: true,
            selected: AtomicBool::new(false),
            options: Vec::new(),
            selected_option: Mutex::new(None),
            relations: HashMap::new(),
            form_markup: None,
            failing: false,
            clicks: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn select(options: &[&str]) -> Self {
        let mut element = Self::new("select");
        element.options = options.iter().map(|o| o.to_string()).collect();
        element
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(self, value: &str) -> Self {
        *self.value.lock() = value.to_string();
        self
    }

    pub fn checked(self, checked: bool) -> Self {
        self.selected.store(checked, Ordering::SeqCst);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Every page operation on this element fails.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn label(mut self, relation: Relation, text: &str) -> Self {
        self.relations
            .insert(relation.into(), Arc::new(FakeElement::new("label").text(text)));
        self
    }

    pub fn in_form(mut self, markup: &str) -> Self {
        self.form_markup = Some(markup.to_string());
        self
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn current_value(&self) -> String {
        self.value.lock().clone()
    }

    pub fn checked_state(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }

    pub fn selected_option(&self) -> Option<usize> {
        *self.selected_option.lock()
    }

    fn check(&self) -> Result<(), PageError> {
        if self.failing {
            return Err(PageError::StaleElement(format!("<{}>", self.tag)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn tag_name(&self) -> Result<String, PageError> {
        self.check()?;
        Ok(self.tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        self.check()?;
        Ok(self.attributes.get(name).cloned())
    }

    async fn value(&self) -> Result<String, PageError> {
        self.check()?;
        Ok(self.value.lock().clone())
    }

    async fn text(&self) -> Result<String, PageError> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn is_displayed(&self) -> Result<bool, PageError> {
        self.check()?;
        Ok(self.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, PageError> {
        self.check()?;
        Ok(self.enabled)
    }

    async fn is_selected(&self) -> Result<bool, PageError> {
        self.check()?;
        Ok(self.selected.load(Ordering::SeqCst))
    }

    async fn clear(&self) -> Result<(), PageError> {
        self.check()?;
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.value.lock().clear();
        Ok(())
    }

    async fn set_value(&self, text: &str) -> Result<(), PageError> {
        self.check()?;
        self.value.lock().push_str(text);
        Ok(())
    }

    async fn click(&self) -> Result<(), PageError> {
        self.check()?;
        self.clicks.fetch_add(1, Ordering::SeqCst);
        let is_radio = self.attributes.get("type").is_some_and(|t| t == "radio");
        if is_radio {
            self.selected.store(true, Ordering::SeqCst);
        } else {
            self.selected.fetch_xor(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn options(&self) -> Result<Vec<String>, PageError> {
        self.check()?;
        Ok(self.options.clone())
    }

    async fn select_option(&self, index: usize) -> Result<(), PageError> {
        self.check()?;
        let text = self
            .options
            .get(index)
            .cloned()
            .ok_or_else(|| PageError::ElementNotFound(format!("option {}", index)))?;
        *self.selected_option.lock() = Some(index);
        *self.value.lock() = text;
        Ok(())
    }

    async fn related(&self, relation: Relation) -> Result<Option<ElementHandle>, PageError> {
        self.check()?;
        Ok(self
            .relations
            .get(&relation.into())
            .map(|e| e.clone() as ElementHandle))
    }

    async fn ancestor_form(&self) -> Result<Option<ElementHandle>, PageError> {
        self.check()?;
        Ok(self
            .form_markup
            .as_ref()
            .map(|markup| Arc::new(FakeElement::new("form").text(markup)) as ElementHandle))
    }

    async fn outer_markup(&self) -> Result<String, PageError> {
        self.check()?;
        // Forms built by `in_form` carry their markup as text.
        Ok(self.text.clone())
    }
}

/// A fake page holding elements in document order.
#[derive(Default)]
pub struct FakePage {
    elements: Vec<Arc<FakeElement>>,
    active: Mutex<Option<Arc<FakeElement>>>,
    body: String,
    body_unavailable: bool,
}

impl FakePage {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            body_unavailable: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, element: FakeElement) -> Self {
        self.elements.push(Arc::new(element));
        self
    }

    pub fn element(&self, index: usize) -> Arc<FakeElement> {
        self.elements[index].clone()
    }

    pub fn focus(&self, index: usize) {
        *self.active.lock() = Some(self.elements[index].clone());
    }
}

#[async_trait]
impl PageAccessor for FakePage {
    async fn find_by_id(&self, id: &str) -> Result<Option<ElementHandle>, PageError> {
        Ok(self
            .elements
            .iter()
            .find(|e| e.attributes.get("id").is_some_and(|v| v == id))
            .map(|e| e.clone() as ElementHandle))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ElementHandle>, PageError> {
        Ok(self
            .elements
            .iter()
            .filter(|e| e.attributes.get("name").is_some_and(|v| v == name))
            .map(|e| e.clone() as ElementHandle)
            .collect())
    }

    async fn active_element(&self) -> Result<Option<ElementHandle>, PageError> {
        Ok(self.active.lock().clone().map(|e| e as ElementHandle))
    }

    async fn body_markup(&self) -> Result<String, PageError> {
        if self.body_unavailable {
            return Err(PageError::Session("page closed".to_string()));
        }
        Ok(self.body.clone())
    }
}

/// Backend answering from a script keyed by field label, recording every
/// request it receives.
pub struct ScriptedBackend {
    answers: HashMap<String, Vec<String>>,
    default_answer: Option<String>,
    calls: Mutex<Vec<(GenerationRequest, GenerationConfig)>>,
    chunk_size: usize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            default_answer: None,
            calls: Mutex::new(Vec::new()),
            chunk_size: 4,
        }
    }

    /// Queue answers for a label, returned in order, the last one repeating.
    pub fn answer(mut self, label: &str, answers: &[&str]) -> Self {
        self.answers
            .insert(label.to_string(), answers.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn otherwise(mut self, answer: &str) -> Self {
        self.default_answer = Some(answer.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(GenerationRequest, GenerationConfig)> {
        self.calls.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().last().map(|(r, _)| r.prompt.clone())
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
    ) -> Result<String, BackendError> {
        if request.cancellation.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        let label = request.field_label.clone();
        let mut calls = self.calls.lock();
        let asked_before = calls.iter().filter(|(r, _)| r.field_label == label).count();
        calls.push((request.clone(), config.clone()));
        drop(calls);

        match self.answers.get(&label) {
            Some(answers) if !answers.is_empty() => {
                let index = asked_before.min(answers.len() - 1);
                Ok(answers[index].clone())
            }
            _ => self
                .default_answer
                .clone()
                .ok_or_else(|| BackendError::Inference(format!("no scripted answer for {:?}", label))),
        }
    }

    async fn stream_generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        on_chunk: formpilot_protocols::ChunkListener<'_>,
    ) -> Result<String, BackendError> {
        let text = self.generate(request, config).await?;
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(self.chunk_size) {
            let chunk: String = chunk.iter().collect();
            on_chunk(&chunk);
        }
        Ok(text)
    }
}
