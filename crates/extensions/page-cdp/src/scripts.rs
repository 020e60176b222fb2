//! JavaScript run inside the page.
//!
//! Function declarations are called with `this` bound to the element.

pub const TAG_NAME: &str = "function() { return this.tagName.toLowerCase(); }";

pub const ATTRIBUTE: &str = "function(name) { return this.getAttribute(name); }";

pub const VALUE: &str = "function() { return this.value == null ? '' : String(this.value); }";

pub const TEXT: &str = "function() { return this.innerText || this.textContent || ''; }";

pub const IS_DISPLAYED: &str = r#"function() {
    if (!this.isConnected || this.getClientRects().length === 0) return false;
    const style = window.getComputedStyle(this);
    return style.visibility !== 'hidden' && style.display !== 'none';
}"#;

pub const IS_ENABLED: &str = "function() { return !this.disabled; }";

pub const IS_SELECTED: &str = "function() { return this.checked === true || this.selected === true; }";

const NOTIFY: &str = "this.dispatchEvent(new Event('input', { bubbles: true })); \
                      this.dispatchEvent(new Event('change', { bubbles: true }));";

/// Empty the value and focus the element so typed text lands in it.
pub fn clear() -> String {
    format!(
        "function() {{ this.focus(); if ('value' in this) {{ this.value = ''; {} }} }}",
        NOTIFY
    )
}

/// Focus with the caret at the end, so typed text is appended.
pub const FOCUS: &str = r#"function() {
    this.scrollIntoView({ block: 'center' });
    this.focus();
    try {
        const end = this.value.length;
        this.setSelectionRange(end, end);
    } catch (e) {}
}"#;

/// Fired after text was typed with `Input.insertText`.
pub const COMMIT_TEXT: &str =
    "function() { this.dispatchEvent(new Event('change', { bubbles: true })); }";

pub const CLICK: &str = "function() { this.scrollIntoView({ block: 'center' }); this.click(); }";

pub const OPTIONS: &str =
    "function() { return Array.from(this.options || []).map(o => o.text.trim()); }";

/// Returns false when `index` is out of range.
pub fn select_option() -> String {
    format!(
        "function(index) {{ if (!this.options || index >= this.options.length) return false; \
         this.selectedIndex = index; {} return true; }}",
        NOTIFY
    )
}

pub const ASSOCIATED_LABEL: &str = r#"function() {
    if (!this.id) return null;
    return document.querySelector('label[for="' + CSS.escape(this.id) + '"]');
}"#;

pub const ANCESTOR_LABEL: &str =
    "function() { return this.parentElement ? this.parentElement.closest('label') : null; }";

pub const PRECEDING_LABEL: &str = r#"function() {
    return document.evaluate('./preceding::label[1]', this, null,
        XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
}"#;

pub const PRECEDING_SIBLING_LABEL: &str = r#"function() {
    for (let el = this.previousElementSibling; el; el = el.previousElementSibling) {
        if (el.tagName === 'LABEL') return el;
        const cls = el.getAttribute('class');
        if (cls && cls.includes('label')) return el;
    }
    return null;
}"#;

pub const ANCESTOR_FORM: &str = "function() { return this.closest('form'); }";

pub const OUTER_MARKUP: &str = "function() { return this.outerHTML; }";

pub const BODY_MARKUP: &str = "document.body ? document.body.outerHTML : ''";

pub const ACTIVE_ELEMENT: &str = r#"(() => {
    const el = document.activeElement;
    return el && el !== document.body && el !== document.documentElement ? el : null;
})()"#;

/// Quote `text` as a JavaScript string literal.
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

pub fn element_by_id(id: &str) -> String {
    format!("document.getElementById({})", js_string(id))
}

pub fn count_by_name(name: &str) -> String {
    format!("document.getElementsByName({}).length", js_string(name))
}

pub fn element_by_name(name: &str, index: usize) -> String {
    format!("document.getElementsByName({})[{}]", js_string(name), index)
}
