/*!
 * Transaction helpers
 *
 * Checkout runs its reservations, order writes, promo usage and cart clear
 * inside one SERIALIZABLE transaction. SQLite has no per-transaction isolation
 * setting; there the transaction claims the database writer lock as its first
 * statement, so concurrent writers queue on the busy timeout instead of
 * failing a read-to-write lock upgrade.
 */

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    IsolationLevel, RuntimeErr, SqlErr, TransactionTrait,
};

/// Postgres SQLSTATEs that mean "retry the whole transaction".
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// SQLite result codes for a lock held by another connection:
/// BUSY, LOCKED, BUSY_RECOVERY, BUSY_SNAPSHOT.
const RETRYABLE_SQLITE_CODES: [&str; 4] = ["5", "6", "261", "517"];

/// A write that touches no rows but still takes the SQLite writer lock.
const SQLITE_CLAIM_WRITER: &str = "UPDATE products SET stock = stock WHERE 1 = 0";

/// Opens a read-write transaction at `SERIALIZABLE` isolation.
pub async fn begin_serializable(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    if db.get_database_backend() == DbBackend::Sqlite {
        let txn = db.begin().await?;
        txn.execute_unprepared(SQLITE_CLAIM_WRITER).await?;
        return Ok(txn);
    }
    db.begin_with_config(
        Some(IsolationLevel::Serializable),
        Some(AccessMode::ReadWrite),
    )
    .await
}

/// True when the database aborted the transaction because of a concurrent
/// conflict (serialization failure or deadlock).
pub fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db_err)) => db_err
            .code()
            .map(|code| {
                RETRYABLE_SQLSTATES.contains(&&*code)
                    || RETRYABLE_SQLITE_CODES.contains(&&*code)
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// True when the statement violated a unique index.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
