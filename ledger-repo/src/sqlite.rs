//! SQLite repository adapter.
//!
//! SQLite has no row locks; a writer holds the database-wide write lock
//! instead. [`SqliteLedgerTx::lock_accounts`] takes that lock before reading,
//! which gives the same read-for-update guarantee at a coarser grain.
#![allow(clippy::collapsible_if)]

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use ledger_types::{
    Account, AccountId, AccountStore, Currency, DomainError, LedgerStore, LedgerTransaction,
    LockedAccount, Money, NewPayment, Payment, PaymentId, PaymentLedger, RepoError,
};

use crate::PoolSettings;
use crate::types::{
    ACCOUNT_COLUMNS, DbAccount, DbPayment, PAYMENT_COLUMNS, map_insert_error, placeholders,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), anyhow::Error> {
    let ddl = include_str!("../migrations/0001_create_ledger_tables.sql");
    for statement in ddl.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration 0001 failed: {}", e))?;
        }
    }
    tracing::debug!(migration = "0001", "migration applied");
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if !is_in_memory(database_url) {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(settings.statement_timeout);

        let pool_options = SqlitePoolOptions::new().acquire_timeout(settings.acquire_timeout);

        // An in-memory database lives exactly as long as its one connection.
        let pool_options = if is_in_memory(database_url) {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(settings.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens an account out-of-band (seeding, administration, tests).
    pub async fn open_account(
        &self,
        identifier: &str,
        currency: Currency,
        balance: Money,
    ) -> Result<Account, RepoError> {
        let now = chrono::Utc::now();

        let (id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO account (identifier, currency, balance, created_at) VALUES (?, ?, ?, ?) RETURNING id"#,
        )
        .bind(identifier)
        .bind(currency.as_str())
        .bind(balance.minor_units())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &format!("Account {}", identifier)))?;

        Ok(Account::from_parts(
            AccountId::new(id),
            identifier.to_string(),
            currency,
            balance,
            now,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Read side
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountStore for SqliteRepo {
    async fn get_accounts(&self, identifiers: &[String]) -> Result<Vec<Account>, RepoError> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM account WHERE identifier IN ({}) ORDER BY identifier",
            ACCOUNT_COLUMNS,
            placeholders(identifiers.len())
        );
        let mut query = sqlx::query_as::<_, DbAccount>(&sql);
        for identifier in identifiers {
            query = query.bind(identifier);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbAccount::into_domain).collect()
    }

    async fn get_available_accounts(&self) -> Result<Vec<Account>, RepoError> {
        let rows: Vec<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM account ORDER BY identifier",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbAccount::into_domain).collect()
    }
}

#[async_trait]
impl PaymentLedger for SqliteRepo {
    async fn get_payments(&self, identifier: &str) -> Result<Vec<Payment>, RepoError> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM account WHERE identifier = ?"#)
            .bind(identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if count == 0 {
            return Err(DomainError::AccountNotFound(vec![identifier.to_string()]).into());
        }

        let rows: Vec<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payment WHERE from_id = ? OR to_id = ? ORDER BY id",
            PAYMENT_COLUMNS
        ))
        .bind(identifier)
        .bind(identifier)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPayment::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Write side (only reachable through a transaction)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerStore for SqliteRepo {
    type Tx = SqliteLedgerTx;

    async fn begin(&self) -> Result<SqliteLedgerTx, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(SqliteLedgerTx {
            tx,
            locked: HashSet::new(),
        })
    }
}

/// An open SQLite transaction.
pub struct SqliteLedgerTx {
    tx: sqlx::Transaction<'static, Sqlite>,
    locked: HashSet<String>,
}

#[async_trait]
impl LedgerTransaction for SqliteLedgerTx {
    async fn lock_accounts(
        &mut self,
        identifiers: &[String],
    ) -> Result<Vec<LockedAccount>, RepoError> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        let list = placeholders(identifiers.len());

        // A no-op write acquires the write lock before anything is read, so
        // the balances below cannot go stale before this transaction ends.
        let touch = format!(
            "UPDATE account SET balance = balance WHERE identifier IN ({})",
            list
        );
        let mut query = sqlx::query(&touch);
        for identifier in identifiers {
            query = query.bind(identifier);
        }
        query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let select = format!(
            "SELECT {} FROM account WHERE identifier IN ({}) ORDER BY identifier",
            ACCOUNT_COLUMNS, list
        );
        let mut query = sqlx::query_as::<_, DbAccount>(&select);
        for identifier in identifiers {
            query = query.bind(identifier);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut locked = Vec::with_capacity(rows.len());
        for row in rows {
            let account = row.into_domain()?;
            self.locked.insert(account.identifier.clone());
            locked.push(LockedAccount::acquired(account));
        }
        Ok(locked)
    }

    async fn write_balance(&mut self, account: &LockedAccount) -> Result<(), RepoError> {
        if !self.locked.contains(account.identifier()) {
            return Err(RepoError::Transaction(format!(
                "account {} is not locked by this transaction",
                account.identifier()
            )));
        }

        let result = sqlx::query(r#"UPDATE account SET balance = ? WHERE identifier = ?"#)
            .bind(account.balance().minor_units())
            .bind(account.identifier())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() != 1 {
            return Err(RepoError::Transaction(format!(
                "balance update of {} touched {} rows",
                account.identifier(),
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn append_payment(&mut self, payment: NewPayment) -> Result<Payment, RepoError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO payment (from_id, to_id, amount, currency, occurred_at)
               VALUES (?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(&payment.from)
        .bind(&payment.to)
        .bind(payment.amount.minor_units())
        .bind(payment.currency.as_str())
        .bind(payment.occurred_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(payment.into_payment(PaymentId::new(id)))
    }

    async fn commit(self) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn rollback(self) -> Result<(), RepoError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}
