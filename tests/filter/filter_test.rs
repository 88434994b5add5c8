#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use recordmodel::filter::normalize;
    use recordmodel::sql::{CompiledStatement, Dialect};
    use recordmodel::store::testing::RecordingExecutor;
    use recordmodel::{
        FieldDescriptor, FilterItem, FilterPredicate, Filters, Model, ModelError, MetadataRecord,
        Operator,
    };
    use serde_json::json;

    fn model() -> Model {
        let metadata = MetadataRecord::new("customers")
            .column(FieldDescriptor::new("id").primary_key())
            .column(FieldDescriptor::new("status").column("cust_status"))
            .column(FieldDescriptor::new("age").column("age_years"));
        Model::new(
            "cust",
            Arc::new(metadata.into()),
            Arc::new(RecordingExecutor::new(Dialect::Postgres)),
        )
    }

    fn compile(filters: impl Into<Filters>) -> CompiledStatement {
        model()
            .select_statement(Some(filters.into()))
            .unwrap()
            .compile(Dialect::Postgres)
    }

    #[test]
    fn test_text_map_and_list_produce_same_query() {
        let text = r#"{"status": "active", "age": {"operator": "BETWEEN", "multipleValues": ["18", "65"]}}"#;

        let json = json!({
            "status": "active",
            "age": {"operator": "BETWEEN", "multipleValues": ["18", "65"]}
        });

        let mut map = BTreeMap::new();
        map.insert("status".to_string(), FilterItem::from("active"));
        map.insert(
            "age".to_string(),
            FilterPredicate::default()
                .operator(Operator::Between)
                .values(["18", "65"])
                .into(),
        );

        let list = vec![
            FilterPredicate::new("age")
                .operator(Operator::Between)
                .values(["18", "65"]),
            FilterPredicate::new("status").value("active"),
        ];

        let expected = compile(text);
        assert_eq!(compile(json), expected);
        assert_eq!(compile(map), expected);
        assert_eq!(compile(list), expected);

        assert_eq!(
            expected.sql,
            "SELECT \"id\" AS \"id\", \"cust_status\" AS \"status\", \"age_years\" AS \"age\" \
             FROM \"customers\" WHERE \"age_years\" BETWEEN $1 AND $2 AND \"cust_status\" = $3"
        );
        assert_eq!(expected.params, vec![json!("18"), json!("65"), json!("active")]);
    }

    #[test]
    fn test_scalar_and_explicit_predicate_are_equivalent() {
        let scalar = compile(json!({"status": "active"}));
        let explicit = compile(json!({"status": {"value": "active"}}));
        let with_operator = compile(json!({"status": {"value": "active", "operator": "="}}));
        assert_eq!(scalar, explicit);
        assert_eq!(scalar, with_operator);
    }

    #[test]
    fn test_status_scenario() {
        let compiled = compile(json!({"status": "active"}));
        assert!(compiled.sql.ends_with("WHERE \"cust_status\" = $1"));
        assert_eq!(compiled.params, vec![json!("active")]);
    }

    #[test]
    fn test_normalize_preserves_list_order() {
        let preds = normalize(json!([
            {"column": "b", "value": 2},
            {"column": "a", "operator": "IS NULL"},
            {"column": "c", "operator": "in", "multipleValues": [1, 2]}
        ]))
        .unwrap();
        let columns: Vec<_> = preds.iter().filter_map(|p| p.column.as_deref()).collect();
        assert_eq!(columns, vec!["b", "a", "c"]);
        assert_eq!(preds[1].operator, Operator::IsNull);
        assert_eq!(preds[2].operator, Operator::In);
    }

    #[test]
    fn test_invalid_filters_surface_as_model_errors() {
        let m = model();
        for bad in ["{oops", "42", "[null]", r#"{"status": {"function": "upper"}}"#] {
            let err = m.select_statement(Some(bad.into())).unwrap_err();
            assert!(
                matches!(err, ModelError::InvalidFilterSyntax(_)),
                "unexpected error for {bad}: {err:?}"
            );
            assert_eq!(err.code(), Some("ERRINVALIDMODELFILTER"));
        }
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        assert!(normalize(json!({"a": {"operator": "~", "value": 1}})).is_err());
    }

    #[test]
    fn test_list_scalar_without_column_fails_at_query_build() {
        let preds = normalize(json!(["loose"])).unwrap();
        assert_eq!(preds[0].column, None);

        let err = model()
            .select_statement(Some(json!(["loose"]).into()))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidFilterSyntax(_)));
    }
}
