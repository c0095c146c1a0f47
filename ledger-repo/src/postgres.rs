//! PostgreSQL repository adapter.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};

use ledger_types::{
    Account, AccountId, AccountStore, Currency, DomainError, LedgerStore, LedgerTransaction,
    LockedAccount, Money, NewPayment, Payment, PaymentId, PaymentLedger, RepoError,
};

use crate::PoolSettings;
use crate::types::{ACCOUNT_COLUMNS, DbAccount, DbPayment, PAYMENT_COLUMNS, map_insert_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    tracing::debug!(migration = name, "migration applied");
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_ledger_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    ///
    /// `statement_timeout` is set on every pooled connection, so a stuck
    /// statement aborts its transaction instead of holding row locks.
    pub async fn new(database_url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let options = PgConnectOptions::from_str(database_url)?.options([(
            "statement_timeout",
            settings.statement_timeout.as_millis().to_string(),
        )]);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Opens an account out-of-band (seeding, administration).
    pub async fn open_account(
        &self,
        identifier: &str,
        currency: Currency,
        balance: Money,
    ) -> Result<Account, RepoError> {
        let now = Utc::now();

        let (id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO account (identifier, currency, balance, created_at) VALUES ($1, $2, $3, $4) RETURNING id"#,
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
impl AccountStore for PostgresRepo {
    async fn get_accounts(&self, identifiers: &[String]) -> Result<Vec<Account>, RepoError> {
        let rows: Vec<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM account WHERE identifier = ANY($1) ORDER BY identifier",
            ACCOUNT_COLUMNS
        ))
        .bind(identifiers)
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
impl PaymentLedger for PostgresRepo {
    async fn get_payments(&self, identifier: &str) -> Result<Vec<Payment>, RepoError> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM account WHERE identifier = $1"#)
            .bind(identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if count == 0 {
            return Err(DomainError::AccountNotFound(vec![identifier.to_string()]).into());
        }

        let rows: Vec<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payment WHERE from_id = $1 OR to_id = $1 ORDER BY id",
            PAYMENT_COLUMNS
        ))
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
impl LedgerStore for PostgresRepo {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> Result<PgLedgerTx, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(PgLedgerTx {
            tx,
            locked: HashSet::new(),
        })
    }
}

/// An open PostgreSQL transaction holding `FOR UPDATE` row locks.
pub struct PgLedgerTx {
    tx: sqlx::Transaction<'static, Postgres>,
    locked: HashSet<String>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTx {
    async fn lock_accounts(
        &mut self,
        identifiers: &[String],
    ) -> Result<Vec<LockedAccount>, RepoError> {
        // Consistent lock order prevents deadlocks between opposite transfers.
        let rows: Vec<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM account WHERE identifier = ANY($1) ORDER BY identifier FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(identifiers)
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

        let result = sqlx::query(r#"UPDATE account SET balance = $1 WHERE identifier = $2"#)
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
               VALUES ($1, $2, $3, $4, $5) RETURNING id"#,
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
