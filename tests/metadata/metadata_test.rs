#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use recordmodel::cache::{CacheStore, MemoryCacheStore, SqliteCacheStore};
    use recordmodel::metadata::{
        MetadataCache, MetadataResolver, MetadataSource, SelectSource, MODEL_NAMESPACE,
    };
    use recordmodel::sql::Dialect;
    use recordmodel::store::testing::RecordingExecutor;
    use recordmodel::store::StoreError;
    use recordmodel::{Metadata, ModelError, ModelRegistry};
    use serde_json::json;

    fn cust_header() -> serde_json::Value {
        json!({
            "id_model": "CUST",
            "schema_name": "",
            "table_name": "Customers",
            "sql": "",
            "sel": "Y",
            "ins": "Y",
            "upd": "Y",
            "del": "Y",
            "row_limit": null
        })
    }

    fn cust_columns() -> Vec<serde_json::Value> {
        vec![
            json!({"id_model": "CUST", "field": "id", "column_name": "id", "type": "integer", "primary_key": "Y", "required": "Y"}),
            json!({"id_model": "CUST", "field": "name", "column_name": "cust_name", "type": "text", "length": 80}),
            json!({"id_model": "CUST", "field": "status", "column_name": "cust_status", "type": "text", "default_value": "new"}),
        ]
    }

    fn scripted_cust() -> Arc<RecordingExecutor> {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_rows([cust_header()]).push_rows(cust_columns());
        exec
    }

    #[tokio::test]
    async fn test_resolve_customer_model() {
        let exec = scripted_cust();
        let resolver = MetadataResolver::new(exec.clone());

        let metadata = resolver.resolve("cust").await.unwrap();
        assert_eq!(metadata.table(), "Customers");
        assert_eq!(metadata.qualified_table().table, "customers");
        assert_eq!(metadata.schema(), None);
        assert_eq!(metadata.source(), &SelectSource::Table);
        assert_eq!(metadata.primary_key(), &["id".to_string()]);

        let perms = metadata.permissions();
        assert!(perms.select && perms.insert && perms.update && perms.delete);

        let name = metadata.field("name").unwrap();
        assert_eq!(name.column_name, "cust_name");
        assert_eq!(name.max_length, Some(80));
        assert_eq!(
            metadata.field("status").unwrap().default_value,
            Some(json!("new"))
        );
        assert!(metadata.field("id").unwrap().required);

        assert_eq!(
            exec.sql_log(),
            vec![
                "SELECT * FROM \"models\" WHERE \"id_model\" = $1",
                "SELECT * FROM \"models_det\" WHERE \"id_model\" = $1",
            ]
        );
        let params: Vec<_> = exec
            .statements()
            .into_iter()
            .flat_map(|s| s.compiled.params)
            .collect();
        assert_eq!(params, vec![json!("CUST"), json!("CUST")]);
    }

    #[tokio::test]
    async fn test_missing_model_stops_before_column_fetch() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_rows(Vec::new());

        let err = MetadataResolver::new(exec.clone())
            .resolve("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ModelNotFound(ref name) if name == "nope"));
        assert_eq!(err.code(), Some("ERRMODELNOTFOUND"));
        assert_eq!(exec.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_control_tables() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_error(StoreError::from_sqlstate(
            "42P01",
            "relation \"models\" does not exist",
        ));

        let err = MetadataResolver::new(exec).resolve("cust").await.unwrap_err();
        assert!(matches!(err, ModelError::ModelStoreNotConfigured));
        assert_eq!(err.code(), Some("ERRMODELNOTCONFIGURED"));
    }

    #[tokio::test]
    async fn test_other_store_errors_pass_through() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_error(StoreError::from_sqlstate("57P01", "terminating connection"));

        let err = MetadataResolver::new(exec).resolve("cust").await.unwrap_err();
        assert!(matches!(err, ModelError::Store(_)));
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn test_raw_sql_model_and_limit() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_rows([json!({
            "id_model": "OPEN_ORDERS",
            "schema_name": "sales",
            "table_name": "orders",
            "sql": "select * from sales.orders where company = :company",
            "sel": "Y",
            "ins": "N",
            "row_limit": "50"
        })])
        .push_rows(Vec::new());

        let metadata = MetadataResolver::new(exec).resolve("open_orders").await.unwrap();
        assert!(matches!(metadata.source(), SelectSource::Raw(_)));
        assert_eq!(metadata.schema(), Some("sales"));
        assert_eq!(metadata.row_limit(), Some(50));
        assert!(metadata.permissions().select);
        assert!(!metadata.permissions().insert);
        assert!(metadata.primary_key().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_field_last_row_wins() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        exec.push_rows([cust_header()]).push_rows([
            json!({"field": "code", "column_name": "code_a"}),
            json!({"field": "code", "column_name": "code_b"}),
        ]);

        let metadata = MetadataResolver::new(exec).resolve("cust").await.unwrap();
        assert_eq!(metadata.columns().len(), 2);
        assert_eq!(metadata.field("code").unwrap().column_name, "code_b");
        assert_eq!(metadata.duplicate_fields(), vec!["code"]);
    }

    #[tokio::test]
    async fn test_registry_caches_metadata() {
        let exec = scripted_cust();
        let store = Arc::new(MemoryCacheStore::new());
        let registry = ModelRegistry::new(exec.clone()).with_cache_store(store.clone());

        let first = registry.get_model("cust").await.unwrap();
        let second = registry.get_model("cust").await.unwrap();
        assert_eq!(first.metadata(), second.metadata());
        assert_eq!(exec.statements().len(), 2);

        let cached = store.get(MODEL_NAMESPACE, "cust").await.unwrap().unwrap();
        assert_eq!(cached["table"], json!("Customers"));
        assert_eq!(cached["columns"][1]["columnName"], json!("cust_name"));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_settle_on_one_entry() {
        let exec = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        for _ in 0..3 {
            exec.push_rows([cust_header()]).push_rows(cust_columns());
        }
        let store = Arc::new(MemoryCacheStore::new());
        let registry = ModelRegistry::new(exec.clone()).with_cache_store(store.clone());

        let lookups = (0..3).map(|_| registry.get_model("cust"));
        let models = futures::future::join_all(lookups).await;
        for model in &models {
            assert_eq!(model.as_ref().unwrap().metadata().table(), "Customers");
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_cache_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("recordmodel-cache-{}", uuid::Uuid::new_v4()));
        let path = dir.join("cache.db");

        {
            let store = Arc::new(SqliteCacheStore::open_at(&path).unwrap());
            let cache = MetadataCache::new(store, Arc::new(MetadataResolver::new(scripted_cust())));
            cache.get_or_load("cust").await.unwrap();
        }

        // A fresh executor with no scripted rows would fail to resolve.
        let empty = Arc::new(RecordingExecutor::new(Dialect::Postgres));
        let store = Arc::new(SqliteCacheStore::open_at(&path).unwrap());
        let cache = MetadataCache::new(store, Arc::new(MetadataResolver::new(empty.clone())));
        let metadata = cache.get_or_load("cust").await.unwrap();
        assert_eq!(metadata.primary_key(), &["id".to_string()]);
        assert!(empty.statements().is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_metadata_serialized_shape() {
        let metadata: Metadata = serde_json::from_value(json!({
            "table": "Orders",
            "schema": "sales",
            "permissions": {"select": true, "insert": false, "update": false, "delete": false},
            "columns": [
                {"field": "id", "columnName": "order_id", "type": "integer", "primaryKey": true}
            ]
        }))
        .unwrap();

        assert_eq!(metadata.qualified_table().table, "orders");
        assert_eq!(metadata.field("id").unwrap().column_name, "order_id");
        assert_eq!(metadata.primary_key(), &["id".to_string()]);

        let round: Metadata =
            serde_json::from_value(serde_json::to_value(&metadata).unwrap()).unwrap();
        assert_eq!(round, metadata);
    }
}
