use super::*;
use crate::testing::FakeElement;

async fn resolve(element: FakeElement) -> ResolvedLabel {
    LabelResolver::new().resolve_with_source(&element).await
}

#[tokio::test]
async fn test_associated_label_wins() {
    let field = FakeElement::input("text")
        .id("email")
        .label(Relation::AssociatedLabel, "Email address")
        .label(Relation::AncestorLabel, "Wrapper")
        .attr("placeholder", "you@example.com");
    let label = resolve(field).await;
    assert_eq!(label.text, "Email address");
    assert_eq!(label.source, LabelSource::AssociatedLabel);
}

#[tokio::test]
async fn test_associated_label_requires_id() {
    let field = FakeElement::input("text")
        .name("email")
        .label(Relation::AssociatedLabel, "Email address");
    let label = resolve(field).await;
    assert_eq!(label.text, "email");
    assert_eq!(label.source, LabelSource::Name);
}

#[tokio::test]
async fn test_ancestor_label() {
    let field = FakeElement::input("text")
        .name("phone")
        .label(Relation::AncestorLabel, "Phone number");
    let label = resolve(field).await;
    assert_eq!(label.text, "Phone number");
    assert_eq!(label.source, LabelSource::AncestorLabel);
}

#[tokio::test]
async fn test_preceding_label_before_sibling() {
    let field = FakeElement::input("text")
        .label(Relation::PrecedingLabel, "Preceding")
        .label(Relation::PrecedingSiblingLabel, "Sibling");
    assert_eq!(resolve(field).await.source, LabelSource::PrecedingLabel);
}

#[tokio::test]
async fn test_preceding_sibling() {
    let field = FakeElement::input("text").label(Relation::PrecedingSiblingLabel, "City");
    assert_eq!(resolve(field).await.text, "City");
}

#[tokio::test]
async fn test_attribute_order() {
    let field = FakeElement::input("text")
        .attr("aria-label", "Aria")
        .attr("placeholder", "Placeholder")
        .name("name");
    assert_eq!(resolve(field).await.source, LabelSource::AriaLabel);

    let field = FakeElement::input("text")
        .attr("placeholder", "Placeholder")
        .name("name");
    assert_eq!(resolve(field).await.source, LabelSource::Placeholder);
}

#[tokio::test]
async fn test_empty_label_falls_through() {
    let field = FakeElement::input("text")
        .id("x")
        .label(Relation::AssociatedLabel, "   ")
        .attr("aria-label", "")
        .attr("placeholder", "Start date");
    let label = resolve(field).await;
    assert_eq!(label.text, "Start date");
}

#[tokio::test]
async fn test_unknown_field_fallback() {
    let label = resolve(FakeElement::input("text")).await;
    assert_eq!(label.text, UNKNOWN_FIELD);
    assert_eq!(label.source, LabelSource::Fallback);
}

#[tokio::test]
async fn test_page_errors_yield_fallback() {
    let field = FakeElement::input("text").name("x").failing();
    assert_eq!(LabelResolver::new().resolve(&field).await, UNKNOWN_FIELD);
}

#[tokio::test]
async fn test_label_trimmed_only_at_ends() {
    let field = FakeElement::input("text")
        .label(Relation::AncestorLabel, "\n  Years of\n   experience? *\n");
    assert_eq!(resolve(field).await.text, "Years of\n   experience? *");
}

#[tokio::test]
async fn test_blank_label_falls_through() {
    let field = FakeElement::input("text")
        .id("city")
        .label(Relation::AssociatedLabel, " \n\t ")
        .attr("placeholder", "City");
    assert_eq!(resolve(field).await.text, "City");
}

#[test]
fn test_source_display() {
    assert_eq!(LabelSource::AssociatedLabel.to_string(), "label[for]");
    assert_eq!(LabelSource::Fallback.to_string(), "fallback");
}
