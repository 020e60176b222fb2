use std::sync::Arc;

use parking_lot::Mutex;

use formpilot_protocols::{DecodingStrategy, PageElement, Relation};

use super::*;
use crate::error::ApplyError;
use crate::scanner::SkipReason;
use crate::testing::{FakeElement, FakePage, ScriptedBackend};

fn years_page() -> Arc<FakePage> {
    let page = FakePage::new(r#"<form><input type="text" id="years"></form>"#).with(
        FakeElement::input("text")
            .id("years")
            .label(Relation::AssociatedLabel, "Years of experience?"),
    );
    page.focus(0);
    Arc::new(page)
}

fn orchestrator(page: &Arc<FakePage>, backend: &Arc<ScriptedBackend>) -> AutofillOrchestrator {
    AutofillOrchestrator::new(page.clone(), backend.clone(), GenerationConfig::default())
        .with_context("Ada, five years of Rust.")
}

#[tokio::test]
async fn test_fill_one_field_end_to_end() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().answer("Years of experience?", &["5"]));
    let mut orch = orchestrator(&page, &backend);

    let report = orch.fill_one_field().await.unwrap();

    assert_eq!(report.label, "Years of experience?");
    assert_eq!(report.answer, "5");
    assert_eq!(page.element(0).current_value(), "5");
    assert_eq!(orch.history().answers("Years of experience?"), ["5"]);
    assert_eq!(orch.application_context().len(), 1);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.strategy, DecodingStrategy::Greedy);
    assert_eq!(calls[0].0.field_label, "Years of experience?");
    assert!(calls[0].0.prompt.contains("Ada, five years of Rust."));
    assert!(calls[0].0.prompt.contains("id=\"years\""));
}

#[tokio::test]
async fn test_fill_one_field_without_focus() {
    let page = Arc::new(FakePage::new("").with(FakeElement::input("text").id("x")));
    let backend = Arc::new(ScriptedBackend::new().otherwise("x"));
    let mut orch = orchestrator(&page, &backend);

    let err = orch.fill_one_field().await.unwrap_err();
    assert!(matches!(err, FillError::NoActiveField));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_fill_one_field_unsupported_element() {
    let page = FakePage::new("").with(FakeElement::new("button").id("go"));
    page.focus(0);
    let page = Arc::new(page);
    let backend = Arc::new(ScriptedBackend::new().otherwise("x"));
    let mut orch = orchestrator(&page, &backend);

    assert!(matches!(
        orch.fill_one_field().await,
        Err(FillError::Unsupported(_))
    ));
}

#[tokio::test]
async fn test_failed_apply_records_nothing() {
    let page = FakePage::new("").with(
        FakeElement::input("checkbox")
            .id("terms")
            .label(Relation::AssociatedLabel, "Accept terms"),
    );
    page.focus(0);
    let page = Arc::new(page);
    let backend = Arc::new(ScriptedBackend::new().answer("Accept terms", &["perhaps"]));
    let mut orch = orchestrator(&page, &backend);

    let err = orch.fill_one_field().await.unwrap_err();
    assert!(matches!(
        err,
        FillError::Apply(ApplyError::InvalidCheckboxResponse(_))
    ));
    assert!(orch.history().is_empty());
    assert!(orch.application_context().is_empty());
    assert_eq!(page.element(0).click_count(), 0);
}

#[tokio::test]
async fn test_fill_all_skips_file_upload() {
    let body = r#"<form><input type="file" id="cv"><input type="text" id="name"></form>"#;
    let page = Arc::new(
        FakePage::new(body)
            .with(FakeElement::input("file").id("cv"))
            .with(
                FakeElement::input("text")
                    .id("name")
                    .label(Relation::AssociatedLabel, "Full name"),
            ),
    );
    let backend = Arc::new(ScriptedBackend::new().answer("Full name", &["Ada Lovelace"]));
    let mut orch = orchestrator(&page, &backend);

    let report = orch.fill_all_fields().await.unwrap();

    assert_eq!(report.filled.len(), 1);
    assert_eq!(report.filled[0].label, "Full name");
    assert_eq!(page.element(1).current_value(), "Ada Lovelace");
    assert_eq!(page.element(0).current_value(), "");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_fill_all_isolates_failures() {
    let body = r#"
        <input type="text" id="name">
        <input type="checkbox" id="terms">
        <select id="country"></select>
    "#;
    let page = Arc::new(
        FakePage::new(body)
            .with(
                FakeElement::input("text")
                    .id("name")
                    .label(Relation::AssociatedLabel, "Full name"),
            )
            .with(
                FakeElement::input("checkbox")
                    .id("terms")
                    .label(Relation::AssociatedLabel, "Accept terms"),
            )
            .with(
                FakeElement::select(&["United States", "Canada", "Other"])
                    .id("country")
                    .label(Relation::AssociatedLabel, "Country"),
            ),
    );
    let backend = Arc::new(
        ScriptedBackend::new()
            .answer("Full name", &["Ada"])
            .answer("Accept terms", &["it depends"])
            .answer("Country", &["Unite States"]),
    );
    let mut orch = orchestrator(&page, &backend);

    let report = orch.fill_all_fields().await.unwrap();

    assert_eq!(report.filled.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].label, "Accept terms");
    assert!(report.failed[0].error.contains("Invalid checkbox response"));
    assert_eq!(page.element(2).selected_option(), Some(0));
    assert_eq!(orch.application_context().len(), 2);
}

#[tokio::test]
async fn test_fill_all_reports_skipped() {
    let body = r#"<input id="shown"><input id="hidden">"#;
    let page = Arc::new(
        FakePage::new(body)
            .with(FakeElement::input("text").id("shown").attr("placeholder", "Shown"))
            .with(FakeElement::input("text").id("hidden").hidden()),
    );
    let backend = Arc::new(ScriptedBackend::new().otherwise("value"));
    let mut orch = orchestrator(&page, &backend);

    let report = orch.fill_all_fields().await.unwrap();
    assert_eq!(report.filled.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Hidden);
}

#[tokio::test]
async fn test_fill_all_unreadable_page() {
    let page = Arc::new(FakePage::unavailable());
    let backend = Arc::new(ScriptedBackend::new().otherwise("x"));
    let mut orch = orchestrator(&page, &backend);
    assert!(matches!(orch.fill_all_fields().await, Err(FillError::Page(_))));
}

#[tokio::test]
async fn test_later_prompts_carry_earlier_answers() {
    let body = r#"<input id="name"><input id="email">"#;
    let page = Arc::new(
        FakePage::new(body)
            .with(FakeElement::input("text").id("name").attr("placeholder", "Full name"))
            .with(FakeElement::input("text").id("email").attr("placeholder", "Email")),
    );
    let backend = Arc::new(
        ScriptedBackend::new()
            .answer("Full name", &["Ada"])
            .answer("Email", &["ada@example.com"]),
    );
    let mut orch = orchestrator(&page, &backend);
    orch.fill_all_fields().await.unwrap();

    let calls = backend.calls();
    assert!(!calls[0].0.prompt.contains("Q: Full name"));
    assert!(calls[1].0.prompt.contains("Q: Full name\nA: Ada"));
}

#[tokio::test]
async fn test_new_application_keeps_history() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().otherwise("5"));
    let mut orch = orchestrator(&page, &backend);
    orch.fill_one_field().await.unwrap();

    orch.new_application();

    assert!(orch.application_context().is_empty());
    assert_eq!(orch.history().len("Years of experience?"), 1);
    orch.fill_one_field().await.unwrap();
    assert!(!backend.last_prompt().unwrap().contains("Q: Years"));
}

#[tokio::test]
async fn test_navigation_without_history() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().otherwise("5"));
    let mut orch = orchestrator(&page, &backend);

    assert_eq!(orch.previous_answer().await.unwrap(), NavigationOutcome::NoHistory);
    assert_eq!(orch.next_answer().await.unwrap(), NavigationOutcome::NoHistory);
    assert_eq!(backend.call_count(), 0);
    assert_eq!(page.element(0).current_value(), "");
}

#[tokio::test]
async fn test_previous_and_next_walk_history() {
    let label = "Years of experience?";
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().answer(label, &["5", "five", "5+"]));
    let mut orch = orchestrator(&page, &backend);
    let value = |page: &Arc<FakePage>| page.element(0).current_value();

    orch.fill_one_field().await.unwrap();
    assert_eq!(value(&page), "5");

    // At the end: next generates.
    assert_eq!(
        orch.next_answer().await.unwrap(),
        NavigationOutcome::Regenerated {
            index: 1,
            answer: "five".to_string()
        }
    );
    assert_eq!(value(&page), "five");

    assert_eq!(
        orch.previous_answer().await.unwrap(),
        NavigationOutcome::Moved {
            index: 0,
            answer: "5".to_string()
        }
    );
    assert_eq!(value(&page), "5");

    // Clamped at the first answer.
    assert_eq!(
        orch.previous_answer().await.unwrap(),
        NavigationOutcome::Unchanged { index: 0 }
    );
    assert_eq!(value(&page), "5");
    assert_eq!(orch.history().len(label), 2);

    assert_eq!(
        orch.next_answer().await.unwrap(),
        NavigationOutcome::Moved {
            index: 1,
            answer: "five".to_string()
        }
    );
    assert_eq!(backend.call_count(), 2);

    // Regenerated answers go to history only.
    assert_eq!(orch.application_context().len(), 1);
}

#[tokio::test]
async fn test_checkbox_navigation_tracks_applied_answer() {
    let label = "Accept terms?";
    let page = FakePage::new(r#"<input type="checkbox" id="terms">"#).with(
        FakeElement::input("checkbox")
            .id("terms")
            .label(Relation::AssociatedLabel, label),
    );
    page.focus(0);
    let page = Arc::new(page);
    let backend = Arc::new(ScriptedBackend::new().answer(label, &["yes", "no"]));
    let mut orch = orchestrator(&page, &backend);

    orch.fill_one_field().await.unwrap();
    assert!(page.element(0).checked_state());
    assert!(matches!(
        orch.next_answer().await.unwrap(),
        NavigationOutcome::Regenerated { index: 1, .. }
    ));
    assert!(!page.element(0).checked_state());

    assert_eq!(
        orch.previous_answer().await.unwrap(),
        NavigationOutcome::Moved {
            index: 0,
            answer: "yes".to_string()
        }
    );
    assert!(page.element(0).checked_state());

    // Steps to the stored "no" instead of asking the model again.
    assert_eq!(
        orch.next_answer().await.unwrap(),
        NavigationOutcome::Moved {
            index: 1,
            answer: "no".to_string()
        }
    );
    assert!(!page.element(0).checked_state());
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_next_after_external_edit_regenerates() {
    let label = "Years of experience?";
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().answer(label, &["5", "6"]));
    let mut orch = orchestrator(&page, &backend);
    orch.fill_one_field().await.unwrap();

    page.element(0).set_value(" (edited)").await.unwrap();

    let outcome = orch.next_answer().await.unwrap();
    assert!(matches!(outcome, NavigationOutcome::Regenerated { index: 1, .. }));
    assert_eq!(page.element(0).current_value(), "6");
}

#[tokio::test]
async fn test_streaming_forwards_chunks() {
    let page = years_page();
    let backend = Arc::new(
        ScriptedBackend::new().answer("Years of experience?", &["Five years of Rust"]),
    );
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink_chunks = chunks.clone();
    let mut orch = AutofillOrchestrator::new(
        page.clone(),
        backend.clone(),
        GenerationConfig::default().with_stream(true),
    )
    .with_chunk_sink(Box::new(move |chunk: &str| {
        sink_chunks.lock().push(chunk.to_string())
    }));

    let report = orch.fill_one_field().await.unwrap();

    let chunks = chunks.lock();
    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), report.answer);
    assert_eq!(page.element(0).current_value(), "Five years of Rust");
}

#[tokio::test]
async fn test_cancelled_pass_stops() {
    let body = r#"<input id="a"><input id="b">"#;
    let page = Arc::new(
        FakePage::new(body)
            .with(FakeElement::input("text").id("a"))
            .with(FakeElement::input("text").id("b")),
    );
    let backend = Arc::new(ScriptedBackend::new().otherwise("x"));
    let token = CancellationToken::new();
    let mut orch = orchestrator(&page, &backend).with_cancellation(token.clone());
    token.cancel();

    let report = orch.fill_all_fields().await.unwrap();
    assert!(report.cancelled);
    assert!(report.filled.is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_cancelled_single_fill() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().otherwise("5"));
    let token = CancellationToken::new();
    let mut orch = orchestrator(&page, &backend).with_cancellation(token.clone());
    token.cancel();

    let err = orch.fill_one_field().await.unwrap_err();
    assert!(matches!(err, FillError::Backend(BackendError::Cancelled)));
    assert_eq!(page.element(0).current_value(), "");
}

#[tokio::test]
async fn test_strategy_change_applies_to_next_call() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().otherwise("5"));
    let mut orch = orchestrator(&page, &backend);

    orch.fill_one_field().await.unwrap();
    let config = orch.generation_config().clone().with_strategy(DecodingStrategy::TopK);
    orch.set_generation_config(config);
    orch.fill_one_field().await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls[0].1.strategy, DecodingStrategy::Greedy);
    assert_eq!(calls[1].1.strategy, DecodingStrategy::TopK);
}

#[tokio::test]
async fn test_swapped_backend_answers_next_call() {
    let page = years_page();
    let first = Arc::new(ScriptedBackend::new().otherwise("5"));
    let second = Arc::new(ScriptedBackend::new().otherwise("7"));
    let mut orch = orchestrator(&page, &first);

    orch.fill_one_field().await.unwrap();
    orch.set_backend(second.clone());
    let filled = orch.fill_one_field().await.unwrap();

    assert_eq!(filled.answer, "7");
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 1);
    assert_eq!(page.element(0).current_value(), "7");
}

#[tokio::test]
async fn test_radio_prompt_lists_choices() {
    let body = r#"<input type="radio" name="relocate" value="yes"><input type="radio" name="relocate" value="no">"#;
    let page = Arc::new(
        FakePage::new(body)
            .with(
                FakeElement::input("radio")
                    .name("relocate")
                    .attr("value", "yes")
                    .label(Relation::AncestorLabel, "Yes, happily"),
            )
            .with(
                FakeElement::input("radio")
                    .name("relocate")
                    .attr("value", "no")
                    .label(Relation::AncestorLabel, "No"),
            ),
    );
    let backend = Arc::new(ScriptedBackend::new().otherwise("no"));
    let mut orch = orchestrator(&page, &backend);

    let report = orch.fill_all_fields().await.unwrap();

    assert_eq!(report.filled.len(), 1);
    assert!(backend.last_prompt().unwrap().contains("exactly one of: Yes, happily, No."));
    assert_eq!(page.element(1).click_count(), 1);
    assert_eq!(page.element(0).click_count(), 0);
}

#[tokio::test]
async fn test_markup_prefers_enclosing_form() {
    let page = FakePage::new("<body>whole page</body>").with(
        FakeElement::input("text")
            .id("city")
            .attr("placeholder", "City")
            .in_form("<form>just the form</form>"),
    );
    page.focus(0);
    let page = Arc::new(page);
    let backend = Arc::new(ScriptedBackend::new().otherwise("Paris"));
    let mut orch = orchestrator(&page, &backend);

    orch.fill_one_field().await.unwrap();
    let prompt = backend.last_prompt().unwrap();
    assert!(prompt.contains("just the form"));
    assert!(!prompt.contains("whole page"));
}

#[tokio::test]
async fn test_markup_omitted_when_disabled() {
    let page = years_page();
    let backend = Arc::new(ScriptedBackend::new().otherwise("5"));
    let mut orch = orchestrator(&page, &backend).with_prompt_builder(PromptBuilder::new(false, 10));

    orch.fill_one_field().await.unwrap();
    assert!(!backend.last_prompt().unwrap().contains("<form>"));
}
