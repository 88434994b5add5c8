//! Single-row mutation transaction.
//!
//! A mutation runs inside its own transaction. More than one affected row
//! rolls it back and fails with [`ModelError::MultipleRowsAffected`]; zero
//! or one row commits. The transaction is ended on every path before an
//! error is returned.

use tracing::{debug, error};

use crate::error::{ModelError, ModelResult};
use crate::sql::Statement;
use crate::store::{QueryOutput, RelationalExecutor, Transaction};

pub async fn execute_single_row(
    executor: &dyn RelationalExecutor,
    statement: &Statement,
) -> ModelResult<QueryOutput> {
    let mut tx = executor.begin_transaction().await.map_err(|e| {
        error!(error = %e, "failed to open transaction");
        e
    })?;

    let output = match tx.query(statement).await {
        Ok(output) => output,
        Err(e) => {
            error!(transaction = tx.id(), error = %e, "mutation failed, rolling back");
            rollback(tx.as_mut()).await;
            return Err(e.into());
        }
    };

    if output.row_count > 1 {
        error!(
            transaction = tx.id(),
            rows = output.row_count,
            "more than one row affected, rolling back"
        );
        rollback(tx.as_mut()).await;
        return Err(ModelError::MultipleRowsAffected {
            count: output.row_count,
        });
    }

    if let Err(e) = tx.commit().await {
        error!(transaction = tx.id(), error = %e, "commit failed");
        rollback(tx.as_mut()).await;
        return Err(e.into());
    }
    debug!(transaction = tx.id(), rows = output.row_count, "mutation committed");

    Ok(output)
}

async fn rollback(tx: &mut dyn Transaction) {
    if let Err(e) = tx.rollback().await {
        error!(transaction = tx.id(), error = %e, "rollback failed");
    }
}
