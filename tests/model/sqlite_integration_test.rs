#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use recordmodel::{
        FieldValues, Globals, ModelError, ModelRegistry, SqliteExecutor, UpdateValues,
    };
    use serde_json::{json, Value};

    const FIXTURES: &str = r#"
        CREATE TABLE models (
            id_model    TEXT PRIMARY KEY,
            schema_name TEXT,
            table_name  TEXT NOT NULL,
            sql         TEXT,
            sel         TEXT,
            ins         TEXT,
            upd         TEXT,
            del         TEXT,
            row_limit   INTEGER
        );
        CREATE TABLE models_det (
            id_model      TEXT NOT NULL,
            field         TEXT NOT NULL,
            column_name   TEXT,
            type          TEXT,
            required      TEXT,
            base_table    TEXT,
            primary_key   TEXT,
            uppercase     TEXT,
            length        INTEGER,
            default_value TEXT
        );

        INSERT INTO models VALUES
            ('CUST', NULL, 'Customers', NULL, 'Y', 'Y', 'Y', 'Y', NULL),
            ('REGION_CUST', NULL, 'customers',
             'select * from customers where region = :region', 'Y', 'N', 'N', 'N', 10);

        INSERT INTO models_det VALUES
            ('CUST', 'id', 'id', 'integer', 'Y', 'Y', 'Y', 'N', NULL, NULL),
            ('CUST', 'name', 'cust_name', 'text', 'Y', 'Y', 'N', 'N', 80, NULL),
            ('CUST', 'status', 'cust_status', 'text', 'N', 'Y', 'N', 'N', 20, 'new'),
            ('CUST', 'region', 'region', 'text', 'N', 'Y', 'N', 'Y', 10, NULL),
            ('REGION_CUST', 'id', 'id', 'integer', 'N', 'N', 'Y', 'N', NULL, NULL),
            ('REGION_CUST', 'name', 'cust_name', 'text', 'N', 'N', 'N', 'N', NULL, NULL);

        CREATE TABLE customers (
            id          INTEGER PRIMARY KEY,
            cust_name   TEXT NOT NULL,
            cust_status TEXT,
            region      TEXT
        );
        INSERT INTO customers VALUES
            (1, 'Acme', 'active', 'NORTH'),
            (2, 'Globex', 'active', 'SOUTH'),
            (3, 'Initech', 'closed', 'NORTH');
    "#;

    fn fields(v: Value) -> FieldValues {
        match v {
            Value::Object(map) => map,
            _ => FieldValues::new(),
        }
    }

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    async fn setup() -> (ModelRegistry, SqliteExecutor) {
        init_logging();
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch(FIXTURES).await.unwrap();
        (ModelRegistry::new(Arc::new(exec.clone())), exec)
    }

    async fn statuses(registry: &ModelRegistry) -> Vec<Value> {
        let model = registry.get_model("cust").await.unwrap();
        let result = model.select_all().await.unwrap();
        result.data.into_iter().map(|row| row["status"].clone()).collect()
    }

    #[tokio::test]
    async fn test_select_translates_columns_to_fields() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("cust").await.unwrap();

        let result = model
            .select(json!({"status": "active", "region": {"operator": "<>", "value": "SOUTH"}}))
            .await
            .unwrap();
        assert_eq!(result.rows, 1);
        assert_eq!(
            result.data[0],
            fields(json!({"id": 1, "name": "Acme", "status": "active", "region": "NORTH"}))
        );
    }

    #[tokio::test]
    async fn test_missing_model() {
        let (registry, _exec) = setup().await;
        let err = registry.get_model("ghost").await.unwrap_err();
        assert!(matches!(err, ModelError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_control_tables() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        let registry = ModelRegistry::new(Arc::new(exec));
        let err = registry.get_model("cust").await.unwrap_err();
        assert!(matches!(err, ModelError::ModelStoreNotConfigured));
    }

    #[tokio::test]
    async fn test_insert_returns_row() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("cust").await.unwrap();

        let result = model
            .insert(&fields(json!({"id": 4, "name": "Umbrella", "region": "EAST"})))
            .await
            .unwrap();
        let row = result.data.unwrap();
        assert_eq!(row["id"], json!(4));
        assert_eq!(row["cust_name"], json!("Umbrella"));
        assert_eq!(row["cust_status"], Value::Null);

        assert_eq!(model.select(json!({"id": 4})).await.unwrap().rows, 1);
    }

    #[tokio::test]
    async fn test_single_row_update_commits() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("cust").await.unwrap();

        let result = model
            .update(&UpdateValues::new(
                fields(json!({"id": 3})),
                fields(json!({"status": "active"})),
            ))
            .await
            .unwrap();
        assert!(result.found);
        assert_eq!(result.data.unwrap()["cust_status"], json!("active"));
        assert_eq!(
            statuses(&registry).await,
            vec![json!("active"), json!("active"), json!("active")]
        );
    }

    #[tokio::test]
    async fn test_update_matching_two_rows_leaves_table_unchanged() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("cust").await.unwrap();

        let err = model
            .update(&UpdateValues::new(
                fields(json!({"status": "active"})),
                fields(json!({"status": "suspended"})),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MultipleRowsAffected { count: 2 }));
        assert_eq!(
            statuses(&registry).await,
            vec![json!("active"), json!("active"), json!("closed")]
        );
    }

    #[tokio::test]
    async fn test_delete_matching_two_rows_leaves_table_unchanged() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("cust").await.unwrap();

        let err = model
            .delete(&fields(json!({"region": "NORTH"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MultipleRowsAffected { count: 2 }));
        assert_eq!(model.select_all().await.unwrap().rows, 3);

        let deleted = model.delete(&fields(json!({"id": 2}))).await.unwrap();
        assert!(deleted.found);
        assert_eq!(model.select_all().await.unwrap().rows, 2);

        let again = model.delete(&fields(json!({"id": 2}))).await.unwrap();
        assert!(!again.found);
    }

    #[tokio::test]
    async fn test_raw_sql_model_with_globals() {
        let (registry, _exec) = setup().await;
        let globals = Globals::from([("region".to_string(), "NORTH".to_string())]);
        let model = registry
            .get_model_with_globals("region_cust", globals)
            .await
            .unwrap();

        let result = model.select(json!({"name": {"operator": "LIKE", "value": "A%"}})).await.unwrap();
        assert_eq!(result.rows, 1);
        assert_eq!(result.data[0], fields(json!({"id": 1, "name": "Acme"})));

        let all = model.select_all().await.unwrap();
        assert_eq!(all.rows, 2);
    }

    #[tokio::test]
    async fn test_raw_sql_model_without_globals() {
        let (registry, _exec) = setup().await;
        let model = registry.get_model("region_cust").await.unwrap();
        let err = model.select_all().await.unwrap_err();
        assert!(matches!(err, ModelError::MissingGlobal(ref g) if g == "region"));
    }
}
