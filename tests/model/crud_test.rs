#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use recordmodel::metadata::Permissions;
    use recordmodel::sql::{Dialect, StatementKind};
    use recordmodel::store::testing::RecordingExecutor;
    use recordmodel::store::StoreError;
    use recordmodel::{
        FieldDescriptor, FieldValues, Model, ModelError, MetadataRecord, UpdateValues,
    };
    use serde_json::{json, Value};

    fn fields(v: Value) -> FieldValues {
        match v {
            Value::Object(map) => map,
            _ => FieldValues::new(),
        }
    }

    fn customers() -> MetadataRecord {
        MetadataRecord::new("Customers")
            .permissions(Permissions::all())
            .column(FieldDescriptor::new("id").primary_key())
            .column(FieldDescriptor::new("status").column("cust_status"))
            .column(FieldDescriptor::new("age").column("age_years"))
    }

    fn setup(dialect: Dialect) -> (Model, Arc<RecordingExecutor>) {
        let exec = Arc::new(RecordingExecutor::new(dialect));
        let model = Model::new("cust", Arc::new(customers().into()), exec.clone());
        (model, exec)
    }

    #[tokio::test]
    async fn test_select_with_filter() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_rows([
            json!({"id": 1, "status": "active", "age": 30}),
            json!({"id": 2, "status": "active", "age": 41}),
        ]);

        let result = model.select(json!({"status": "active"})).await.unwrap();
        assert_eq!(result.rows, 2);
        assert_eq!(result.data[1]["id"], json!(2));

        let statements = exec.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].compiled.sql,
            "SELECT \"id\" AS \"id\", \"cust_status\" AS \"status\", \"age_years\" AS \"age\" \
             FROM \"customers\" WHERE \"cust_status\" = $1"
        );
        assert_eq!(statements[0].compiled.params, vec![json!("active")]);
        assert_eq!(statements[0].transaction, None);
    }

    #[tokio::test]
    async fn test_select_between_text_filter() {
        let (model, exec) = setup(Dialect::Postgres);
        model
            .select(r#"{"age": {"operator": "BETWEEN", "multipleValues": ["18", "65"]}}"#)
            .await
            .unwrap();

        let compiled = &exec.statements()[0].compiled;
        assert!(compiled
            .sql
            .ends_with("WHERE \"age_years\" BETWEEN $1 AND $2"));
        assert_eq!(compiled.params, vec![json!("18"), json!("65")]);
    }

    #[tokio::test]
    async fn test_select_sqlite_placeholders() {
        let (model, exec) = setup(Dialect::Sqlite);
        model
            .select(json!([
                {"column": "status", "operator": "IN", "multipleValues": ["a", "b"]},
                {"column": "age", "operator": ">=", "value": 21}
            ]))
            .await
            .unwrap();

        let compiled = &exec.statements()[0].compiled;
        assert!(compiled
            .sql
            .ends_with("WHERE \"cust_status\" IN (?, ?) AND \"age_years\" >= ?"));
        assert_eq!(compiled.params, vec![json!("a"), json!("b"), json!(21)]);
    }

    #[tokio::test]
    async fn test_select_invalid_filter_runs_nothing() {
        let (model, exec) = setup(Dialect::Postgres);
        let err = model.select("not json").await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidFilterSyntax(_)));
        assert!(exec.statements().is_empty());
    }

    #[tokio::test]
    async fn test_insert_returns_first_row() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_rows([json!({"id": 7, "cust_status": "new", "age_years": null})]);

        let result = model
            .insert(&fields(json!({"id": 7, "status": "new", "unknown": "dropped"})))
            .await
            .unwrap();
        assert_eq!(result.data.unwrap()["id"], json!(7));

        let compiled = &exec.statements()[0].compiled;
        assert_eq!(
            compiled.sql,
            "INSERT INTO \"customers\" (\"cust_status\", \"id\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(compiled.params, vec![json!("new"), json!(7)]);
    }

    #[tokio::test]
    async fn test_insert_without_returning_on_mysql() {
        let (model, exec) = setup(Dialect::MySql);
        exec.push_rows_with_count(Vec::new(), 1);

        let result = model.insert(&fields(json!({"id": 7}))).await.unwrap();
        assert_eq!(result.data, None);
        assert_eq!(
            exec.sql_log(),
            vec!["INSERT INTO `customers` (`id`) VALUES (?)"]
        );
    }

    #[tokio::test]
    async fn test_update_single_row_commits() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_rows([json!({"id": 1, "cust_status": "closed"})]);

        let result = model
            .update(&UpdateValues::new(
                fields(json!({"id": 1})),
                fields(json!({"status": "closed"})),
            ))
            .await
            .unwrap();
        assert!(result.found);
        assert_eq!(result.data.unwrap()["cust_status"], json!("closed"));

        assert_eq!(
            exec.sql_log(),
            vec![
                "BEGIN",
                "UPDATE \"customers\" SET \"cust_status\" = $1 WHERE \"id\" = $2 RETURNING *",
                "COMMIT",
            ]
        );
        assert!(exec
            .statements()
            .iter()
            .all(|s| s.transaction.as_deref() == Some("tx-1")));
    }

    #[tokio::test]
    async fn test_update_more_than_one_row_rolls_back() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_rows_with_count(Vec::new(), 2);

        let err = model
            .update(&UpdateValues::new(
                fields(json!({"status": "active"})),
                fields(json!({"status": "closed"})),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MultipleRowsAffected { count: 2 }));
        assert_eq!(err.code(), Some("ERRMORETHAN1ROWUPDATED"));

        let kinds: Vec<_> = exec.statements().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![StatementKind::Raw, StatementKind::Update, StatementKind::Raw]
        );
        let log = exec.sql_log();
        assert_eq!(log.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!log.iter().any(|s| s == "COMMIT"));
    }

    #[tokio::test]
    async fn test_update_with_only_unknown_fields() {
        let (model, exec) = setup(Dialect::Postgres);
        let err = model
            .update(&UpdateValues::new(
                fields(json!({"id": 1})),
                fields(json!({"nope": 1})),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::NothingToUpdate));
        assert_eq!(exec.transactions_started(), 0);
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (model, exec) = setup(Dialect::Postgres);

        let result = model.delete(&fields(json!({"id": 99}))).await.unwrap();
        assert!(!result.found);
        assert_eq!(result.data, None);
        assert_eq!(exec.sql_log().last().map(String::as_str), Some("COMMIT"));
    }

    #[tokio::test]
    async fn test_delete_returns_deleted_row() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_rows([json!({"id": 3, "cust_status": "gone"})]);

        let result = model.delete(&fields(json!({"id": 3}))).await.unwrap();
        assert!(result.found);
        assert_eq!(result.data.unwrap()["id"], json!(3));
        assert_eq!(
            exec.sql_log()[1],
            "DELETE FROM \"customers\" WHERE \"id\" = $1 RETURNING *"
        );
    }

    #[tokio::test]
    async fn test_delete_store_error_rolls_back() {
        let (model, exec) = setup(Dialect::Postgres);
        exec.push_error(StoreError::from_sqlstate("23503", "foreign key violation"));

        let err = model.delete(&fields(json!({"id": 3}))).await.unwrap_err();
        assert!(matches!(err, ModelError::Store(_)));
        assert_eq!(exec.sql_log().last().map(String::as_str), Some("ROLLBACK"));
    }

    #[tokio::test]
    async fn test_strict_mode_passes_physical_columns() {
        let (model, exec) = setup(Dialect::Postgres);
        let model = model.with_strict_mode(true);

        model
            .delete(&fields(json!({"cust_status": "x"})))
            .await
            .unwrap();
        assert_eq!(
            exec.sql_log()[1],
            "DELETE FROM \"customers\" WHERE \"cust_status\" = $1 RETURNING *"
        );
    }
}
