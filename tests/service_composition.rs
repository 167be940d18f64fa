//! End-to-end service behavior across the provider stack
//!
//! Provider priority is document, then environment, then library: a
//! locally-bound name shadows the library definition of the same name in
//! completions and hover, and the library only answers signature help
//! for calls the document does not bind.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use fathom_services::{ItemKind, LanguageService, Library, ServiceError};
use fathom_syntax::Position;

const URI: &str = "file:///composition.fm";

#[tokio::test]
async fn test_document_binding_shadows_library_completion() {
    let service = LanguageService::new();
    // `abs` is also a library function; the local binding must win
    service.open_document(URI, "let abs = 1 in ab");
    let items = service
        .get_autocomplete_items(URI, Position::new(0, 17), None)
        .await
        .expect("items");
    let abs: Vec<_> = items.iter().filter(|item| item.label == "abs").collect();
    assert_eq!(abs.len(), 1, "duplicate labels must collapse");
    assert_eq!(abs[0].kind, ItemKind::Variable);
}

#[tokio::test]
async fn test_completions_span_scope_keywords_and_library() {
    let service = LanguageService::new();
    service.open_document(URI, "let lengthy = 1 in le");
    let items = service
        .get_autocomplete_items(URI, Position::new(0, 21), None)
        .await
        .expect("items");
    let find = |label: &str| items.iter().find(|item| item.label == label);
    assert_eq!(find("lengthy").map(|i| i.kind), Some(ItemKind::Variable));
    assert_eq!(find("let").map(|i| i.kind), Some(ItemKind::Keyword));
    assert_eq!(find("length").map(|i| i.kind), Some(ItemKind::Function));
}

#[tokio::test]
async fn test_hover_prefers_the_local_binding() {
    let service = LanguageService::new();
    service.open_document(URI, "let abs = 1 in abs");
    let hover = service
        .get_hover(URI, Position::new(0, 18), None)
        .await
        .expect("hover")
        .expect("answer");
    assert!(hover.contents.contains("let variable"));
}

#[tokio::test]
async fn test_hover_falls_back_to_the_library() {
    let service = LanguageService::new();
    service.open_document(URI, "abs");
    let hover = service
        .get_hover(URI, Position::new(0, 3), None)
        .await
        .expect("hover")
        .expect("answer");
    assert!(hover.contents.contains("absolute value"));
}

#[tokio::test]
async fn test_keyword_hover_comes_from_the_environment() {
    let service = LanguageService::new();
    service.open_document(URI, "each 1");
    let hover = service
        .get_hover(URI, Position::new(0, 4), None)
        .await
        .expect("hover")
        .expect("answer");
    assert!(hover.contents.contains("one-parameter function"));
}

#[tokio::test]
async fn test_signature_help_for_a_library_call() {
    let service = LanguageService::new();
    service.open_document(URI, "min(1, 2)");
    let help = service
        .get_signature_help(URI, Position::new(0, 8), None)
        .await
        .expect("help")
        .expect("answer");
    assert_eq!(help.signatures.len(), 1);
    assert!(help.signatures[0].label.starts_with("min("));
    assert_eq!(help.active_parameter, 1);
}

#[tokio::test]
async fn test_signature_help_for_a_document_function() {
    let service = LanguageService::new();
    service.open_document(URI, "let f = (a as number) => a in f(1)");
    let help = service
        .get_signature_help(URI, Position::new(0, 33), None)
        .await
        .expect("help")
        .expect("answer");
    assert!(help.signatures[0].label.starts_with("f("));
    assert_eq!(help.active_parameter, 0);
}

#[tokio::test]
async fn test_registered_library_definitions_reach_completions() {
    let library = Arc::new(Library::new());
    library.register(fathom_services::LibraryDefinition::new(
        "customHelper",
        fathom_services::LibraryItemKind::Function,
        fathom_syntax::Type::Any,
        "A host-registered helper.",
    ));
    let service = LanguageService::with_library(library);
    service.open_document(URI, "customH");
    let items = service
        .get_autocomplete_items(URI, Position::new(0, 7), None)
        .await
        .expect("items");
    assert!(items.iter().any(|item| item.label == "customHelper"));
}

#[tokio::test]
async fn test_pre_canceled_request_reports_canceled() {
    let service = LanguageService::new();
    service.open_document(URI, "let a = 1 in a");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = service
        .get_autocomplete_items(URI, Position::new(0, 14), Some(cancel))
        .await;
    assert!(matches!(result, Err(ServiceError::Canceled)));
}

#[tokio::test]
async fn test_out_of_bounds_position_yields_empty_answers() {
    let service = LanguageService::new();
    service.open_document(URI, "1 + 2");
    let hover = service
        .get_hover(URI, Position::new(9, 0), None)
        .await
        .expect("hover");
    assert!(hover.is_none());
    let help = service
        .get_signature_help(URI, Position::new(9, 0), None)
        .await
        .expect("help");
    assert!(help.is_none());
}
