//! Ledger Application Service
//!
//! Orchestrates transfers through the storage ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::Instrument;

use ledger_types::{
    Account, DomainError, LedgerError, LedgerStore, LedgerTransaction, Money, NewPayment, Payment,
    PaymentHistory,
};

/// The transfer engine.
///
/// Generic over `S: LedgerStore` - the adapter is injected at compile time.
/// The engine keeps no balances of its own; every transfer is serialized by
/// the row locks of the storage transaction it opens.
pub struct LedgerService<S: LedgerStore> {
    store: S,
    halted: Arc<AtomicBool>,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Creates a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            halted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// False once a rollback has failed. The ledger can no longer be assumed
    /// consistent and transfers stay refused until the process restarts.
    pub fn is_healthy(&self) -> bool {
        !self.halted.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store
            .get_available_accounts()
            .await
            .map_err(Into::into)
    }

    /// Returns the payments of an account, split into sent and received.
    pub async fn payments(&self, identifier: &str) -> Result<PaymentHistory, LedgerError> {
        let payments = self.store.get_payments(identifier).await?;
        Ok(PaymentHistory::split(identifier, payments))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transfer
    // ─────────────────────────────────────────────────────────────────────────────

    /// Moves `amount` minor units from `from` to `to` and records the payment.
    ///
    /// Either both balances change and exactly one payment is appended, or
    /// nothing changes and the error says why.
    #[tracing::instrument(skip(self))]
    pub async fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<Payment, LedgerError> {
        if !self.is_healthy() {
            return Err(LedgerError::internal(
                "ledger halted after a failed rollback",
            ));
        }

        let amount = Money::positive(amount)?;
        let identifiers = participants(from, to);

        let accounts = self.store.get_accounts(&identifiers).await?;
        let (source, destination) = resolve(&accounts, from, to, |a| a.identifier.as_str())?;
        validate(&accounts[source], &accounts[destination], amount)?;

        let tx = self.store.begin().await?;

        // Once begun, the transfer runs detached: a caller that goes away
        // cannot stop it between the balance writes and the ledger insert.
        let halted = Arc::clone(&self.halted);
        let (from, to) = (from.to_string(), to.to_string());
        let task = async move {
            let result = settle(tx, &from, &to, amount).await;
            match &result {
                Ok(payment) => {
                    tracing::info!(payment_id = %payment.id, "transfer committed");
                }
                Err(err @ LedgerError::RollbackFailed { .. }) => {
                    halted.store(true, Ordering::SeqCst);
                    tracing::error!(alarm = true, error = %err, "rollback failed, ledger halted");
                }
                Err(err) => {
                    tracing::debug!(error = %err, "transfer rejected");
                }
            }
            result
        };

        tokio::spawn(task.instrument(tracing::Span::current()))
            .await
            .map_err(|e| LedgerError::internal(format!("transfer task failed: {}", e)))?
    }
}

/// Applies the transfer inside `tx`, then commits or rolls back.
async fn settle<T: LedgerTransaction>(
    mut tx: T,
    from: &str,
    to: &str,
    amount: Money,
) -> Result<Payment, LedgerError> {
    match write_transfer(&mut tx, from, to, amount).await {
        Ok(payment) => {
            tx.commit().await?;
            Ok(payment)
        }
        Err(err) => match tx.rollback().await {
            Ok(()) => Err(err),
            Err(rollback) => Err(LedgerError::RollbackFailed {
                cause: err.to_string(),
                rollback: rollback.to_string(),
            }),
        },
    }
}

async fn write_transfer<T: LedgerTransaction>(
    tx: &mut T,
    from: &str,
    to: &str,
    amount: Money,
) -> Result<Payment, LedgerError> {
    let mut locked = tx.lock_accounts(&participants(from, to)).await?;

    // Balances read before the transaction may be stale; only these count.
    let (source, destination) = resolve(&locked, from, to, |l| l.identifier())?;
    validate(locked[source].account(), locked[destination].account(), amount)?;
    let currency = locked[source].currency();

    locked[source].debit(amount)?;
    locked[destination].credit(amount)?;

    for account in locked.iter().filter(|l| l.balance() != l.read_balance()) {
        tx.write_balance(account).await?;
    }

    let payment = tx
        .append_payment(NewPayment {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            currency,
            occurred_at: Utc::now(),
        })
        .await?;

    Ok(payment)
}

/// The distinct identifiers taking part in a transfer.
fn participants(from: &str, to: &str) -> Vec<String> {
    if from == to {
        vec![from.to_string()]
    } else {
        vec![from.to_string(), to.to_string()]
    }
}

/// Positions of source and destination in `found`, naming whichever is missing.
///
/// Both are the same index for a self-transfer.
fn resolve<T>(
    found: &[T],
    from: &str,
    to: &str,
    identifier: impl Fn(&T) -> &str,
) -> Result<(usize, usize), DomainError> {
    let source = found.iter().position(|a| identifier(a) == from);
    let destination = found.iter().position(|a| identifier(a) == to);

    match (source, destination) {
        (Some(source), Some(destination)) => Ok((source, destination)),
        _ => {
            let mut missing = Vec::new();
            if source.is_none() {
                missing.push(from.to_string());
            }
            if destination.is_none() && from != to {
                missing.push(to.to_string());
            }
            Err(DomainError::AccountNotFound(missing))
        }
    }
}

fn validate(source: &Account, destination: &Account, amount: Money) -> Result<(), DomainError> {
    if source.currency != destination.currency {
        return Err(DomainError::CurrencyMismatch {
            from: source.currency,
            to: destination.currency,
        });
    }

    if !source.has_sufficient_funds(amount) {
        return Err(DomainError::InsufficientFunds {
            available: source.balance.minor_units(),
            requested: amount.minor_units(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_positions() {
        let found = ["B", "A"];

        assert_eq!(resolve(&found, "A", "B", |s| *s).unwrap(), (1, 0));
        assert_eq!(resolve(&found, "B", "B", |s| *s).unwrap(), (0, 0));
    }

    #[test]
    fn test_resolve_names_missing_identifiers() {
        let found = ["A"];

        assert_eq!(
            resolve(&found, "X", "A", |s| *s).unwrap_err(),
            DomainError::AccountNotFound(vec!["X".to_string()])
        );
        assert_eq!(
            resolve(&found, "X", "Z", |s| *s).unwrap_err(),
            DomainError::AccountNotFound(vec!["X".to_string(), "Z".to_string()])
        );
        assert_eq!(
            resolve(&found, "X", "X", |s| *s).unwrap_err(),
            DomainError::AccountNotFound(vec!["X".to_string()])
        );
    }
}
