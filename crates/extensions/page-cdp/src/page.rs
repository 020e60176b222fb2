//! Page and element access over a CDP session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, trace};

use formpilot_protocols::{ElementHandle, PageAccessor, PageElement, PageError, Relation};

use crate::cdp::{CdpError, PageSession, RemoteObject};
use crate::scripts;

/// The live page in the attached tab.
#[derive(Clone)]
pub struct CdpPage {
    session: Arc<PageSession>,
}

impl CdpPage {
    pub fn new(session: PageSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    fn handle(&self, object: RemoteObject) -> Option<ElementHandle> {
        to_handle(&self.session, object)
    }
}

fn to_handle(session: &Arc<PageSession>, object: RemoteObject) -> Option<ElementHandle> {
    let object_id = object.node_id()?.to_string();
    let element: ElementHandle = Arc::new(CdpElement {
        session: session.clone(),
        object_id,
    });
    Some(element)
}

#[async_trait]
impl PageAccessor for CdpPage {
    async fn find_by_id(&self, id: &str) -> Result<Option<ElementHandle>, PageError> {
        let object = self
            .session
            .evaluate_handle(&scripts::element_by_id(id))
            .await?;
        Ok(self.handle(object))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ElementHandle>, PageError> {
        let count = self
            .session
            .evaluate(&scripts::count_by_name(name))
            .await?
            .as_u64()
            .unwrap_or(0) as usize;

        let mut elements = Vec::with_capacity(count);
        for index in 0..count {
            let object = self
                .session
                .evaluate_handle(&scripts::element_by_name(name, index))
                .await?;
            elements.extend(self.handle(object));
        }
        debug!("{} elements named {:?}", elements.len(), name);
        Ok(elements)
    }

    async fn active_element(&self) -> Result<Option<ElementHandle>, PageError> {
        let object = self.session.evaluate_handle(scripts::ACTIVE_ELEMENT).await?;
        Ok(self.handle(object))
    }

    async fn body_markup(&self) -> Result<String, PageError> {
        let value = self.session.evaluate(scripts::BODY_MARKUP).await?;
        Ok(as_string(value))
    }
}

/// An element of the attached page, addressed by its remote object id.
pub struct CdpElement {
    session: Arc<PageSession>,
    object_id: String,
}

impl CdpElement {
    async fn call(&self, function: &str, args: &[Value]) -> Result<Value, CdpError> {
        trace!("callFunctionOn {}", self.object_id);
        self.session
            .call_function_on(&self.object_id, function, args)
            .await
    }

    async fn string(&self, function: &str) -> Result<String, PageError> {
        Ok(as_string(self.call(function, &[]).await?))
    }

    async fn flag(&self, function: &str) -> Result<bool, PageError> {
        Ok(self.call(function, &[]).await?.as_bool().unwrap_or(false))
    }

    async fn element(&self, function: &str) -> Result<Option<ElementHandle>, PageError> {
        let object = self
            .session
            .call_function_handle(&self.object_id, function, &[])
            .await?;
        Ok(to_handle(&self.session, object))
    }
}

#[async_trait]
impl PageElement for CdpElement {
    async fn tag_name(&self) -> Result<String, PageError> {
        self.string(scripts::TAG_NAME).await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        let value = self.call(scripts::ATTRIBUTE, &[json!(name)]).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn value(&self) -> Result<String, PageError> {
        self.string(scripts::VALUE).await
    }

    async fn text(&self) -> Result<String, PageError> {
        self.string(scripts::TEXT).await
    }

    async fn is_displayed(&self) -> Result<bool, PageError> {
        self.flag(scripts::IS_DISPLAYED).await
    }

    async fn is_enabled(&self) -> Result<bool, PageError> {
        self.flag(scripts::IS_ENABLED).await
    }

    async fn is_selected(&self) -> Result<bool, PageError> {
        self.flag(scripts::IS_SELECTED).await
    }

    async fn clear(&self) -> Result<(), PageError> {
        self.call(&scripts::clear(), &[]).await?;
        Ok(())
    }

    async fn set_value(&self, text: &str) -> Result<(), PageError> {
        self.call(scripts::FOCUS, &[]).await?;
        self.session.insert_text(text).await?;
        self.call(scripts::COMMIT_TEXT, &[]).await?;
        Ok(())
    }

    async fn click(&self) -> Result<(), PageError> {
        self.call(scripts::CLICK, &[]).await?;
        Ok(())
    }

    async fn options(&self) -> Result<Vec<String>, PageError> {
        let value = self.call(scripts::OPTIONS, &[]).await?;
        Ok(string_list(value))
    }

    async fn select_option(&self, index: usize) -> Result<(), PageError> {
        let selected = self
            .call(&scripts::select_option(), &[json!(index)])
            .await?
            .as_bool()
            .unwrap_or(false);
        if !selected {
            return Err(PageError::ElementNotFound(format!("option {}", index)));
        }
        Ok(())
    }

    async fn related(&self, relation: Relation) -> Result<Option<ElementHandle>, PageError> {
        let script = match relation {
            Relation::AssociatedLabel => scripts::ASSOCIATED_LABEL,
            Relation::AncestorLabel => scripts::ANCESTOR_LABEL,
            Relation::PrecedingLabel => scripts::PRECEDING_LABEL,
            Relation::PrecedingSiblingLabel => scripts::PRECEDING_SIBLING_LABEL,
        };
        self.element(script).await
    }

    async fn ancestor_form(&self) -> Result<Option<ElementHandle>, PageError> {
        self.element(scripts::ANCESTOR_FORM).await
    }

    async fn outer_markup(&self) -> Result<String, PageError> {
        self.string(scripts::OUTER_MARKUP).await
    }
}

fn as_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().map(as_string).collect(),
        _ => Vec::new(),
    }
}
