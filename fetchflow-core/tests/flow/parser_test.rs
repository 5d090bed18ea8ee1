use crate::helpers::Item;
use bytes::Bytes;
use fetchflow_core::{
    parse::{ItemParser, PruningCollectionParser, StrictCollectionParser},
    ElementArity, FlowError, Parser, ParserSelection,
};

#[cfg(test)]
mod parser_tests {
    use super::*;

    const MIXED: &str = r#"[
        {"id": 1, "name": "first"},
        {"id": "not-a-number", "name": "broken"},
        {"id": 3, "name": "third"},
        {"name": "missing id"}
    ]"#;

    #[test]
    fn it_should_select_item_parser_for_single_items_regardless_of_pruning() {
        assert_eq!(ParserSelection::select(ElementArity::Single, false), ParserSelection::Item);
        assert_eq!(ParserSelection::select(ElementArity::Single, true), ParserSelection::Item);
    }

    #[test]
    fn it_should_select_collection_parser_by_pruning_flag() {
        assert_eq!(
            ParserSelection::select(ElementArity::Collection, false),
            ParserSelection::StrictCollection
        );
        assert_eq!(
            ParserSelection::select(ElementArity::Collection, true),
            ParserSelection::PruningCollection
        );
    }

    #[tokio::test]
    async fn it_should_parse_single_item() {
        // Given
        let parser = ItemParser::<Item>::new();

        // When
        let result = parser.parse(Bytes::from(r#"{"id": 7, "name": "seven"}"#)).await;

        // Then
        assert_eq!(result, Ok(Item::new(7, "seven")));
    }

    #[tokio::test]
    async fn it_should_fail_single_item_on_malformed_payload() {
        // Given
        let parser = ItemParser::<Item>::new();

        // When
        let result = parser.parse(Bytes::from(r#"{"id": "seven"}"#)).await;

        // Then
        assert!(matches!(result, Err(FlowError::Parse(_))));
    }

    #[tokio::test]
    async fn it_should_keep_only_valid_elements_when_pruning() {
        // Given
        let parser = PruningCollectionParser::<Item>::new();

        // When
        let result = parser.parse(Bytes::from(MIXED)).await;

        // Then
        assert_eq!(result, Ok(vec![Item::new(1, "first"), Item::new(3, "third")]));
    }

    #[tokio::test]
    async fn it_should_succeed_with_empty_collection_when_every_element_is_pruned() {
        // Given
        let parser = PruningCollectionParser::<Item>::new();

        // When
        let result = parser.parse(Bytes::from(r#"[1, "two", null]"#)).await;

        // Then
        assert_eq!(result, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn it_should_fail_pruning_when_payload_is_not_a_collection() {
        // Given
        let parser = PruningCollectionParser::<Item>::new();

        // When
        let result = parser.parse(Bytes::from(r#"{"id": 1, "name": "lonely"}"#)).await;

        // Then
        assert!(matches!(result, Err(FlowError::Parse(_))));
    }

    #[tokio::test]
    async fn it_should_fail_strict_parse_on_first_invalid_element() {
        // Given
        let parser = StrictCollectionParser::<Item>::new();
        let payload = r#"[{"id": "bad"}, {"id": 2, "name": "fine"}]"#;

        // When
        let result = parser.parse(Bytes::from(payload)).await;

        // Then
        match result {
            Err(FlowError::Parse(message)) => assert!(message.starts_with("element 0")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn it_should_parse_strict_collection_when_all_elements_are_valid() {
        // Given
        let parser = StrictCollectionParser::<Item>::new();

        // When
        let result = parser
            .parse(Bytes::from(r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#))
            .await;

        // Then
        assert_eq!(result, Ok(vec![Item::new(1, "a"), Item::new(2, "b")]));
    }
}
