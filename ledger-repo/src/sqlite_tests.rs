//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ledger_types::{
        AccountStore, Currency, DomainError, LedgerStore, LedgerTransaction, LockedAccount,
        Money, NewPayment, PaymentLedger, RepoError,
    };

    use crate::{PoolSettings, SqliteRepo};

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:", &PoolSettings::default())
            .await
            .unwrap()
    }

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    fn cents(n: i64) -> Money {
        Money::new(n).unwrap()
    }

    fn ids(identifiers: &[&str]) -> Vec<String> {
        identifiers.iter().map(|s| s.to_string()).collect()
    }

    /// Seeds the A/B/C accounts used throughout the ledger examples.
    async fn seeded_repo() -> SqliteRepo {
        let repo = setup_repo().await;
        repo.open_account("A", usd(), cents(10000)).await.unwrap();
        repo.open_account("B", usd(), cents(1000)).await.unwrap();
        repo.open_account("C", eur(), cents(5000)).await.unwrap();
        repo
    }

    fn new_payment(from: &str, to: &str, amount: i64) -> NewPayment {
        NewPayment {
            from: from.to_string(),
            to: to.to_string(),
            amount: cents(amount),
            currency: usd(),
            occurred_at: Utc::now(),
        }
    }

    async fn balance_of(repo: &SqliteRepo, identifier: &str) -> i64 {
        repo.get_accounts(&ids(&[identifier])).await.unwrap()[0]
            .balance
            .minor_units()
    }

    #[tokio::test]
    async fn test_open_account() {
        let repo = setup_repo().await;

        let account = repo.open_account("A", usd(), cents(10000)).await.unwrap();

        assert_eq!(account.identifier, "A");
        assert_eq!(account.currency, usd());
        assert_eq!(account.balance.minor_units(), 10000);
    }

    #[tokio::test]
    async fn test_open_account_duplicate_identifier_conflicts() {
        let repo = setup_repo().await;
        repo.open_account("A", usd(), cents(0)).await.unwrap();

        let result = repo.open_account("A", eur(), cents(0)).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_accounts_skips_missing() {
        let repo = seeded_repo().await;

        let accounts = repo.get_accounts(&ids(&["B", "X", "A"])).await.unwrap();

        let found: Vec<&str> = accounts.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(found, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_get_accounts_empty_request() {
        let repo = seeded_repo().await;

        let accounts = repo.get_accounts(&[]).await.unwrap();

        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn test_get_available_accounts() {
        let repo = seeded_repo().await;

        let accounts = repo.get_available_accounts().await.unwrap();

        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[2].identifier, "C");
        assert_eq!(accounts[2].currency, eur());
    }

    #[tokio::test]
    async fn test_get_payments_unknown_account() {
        let repo = seeded_repo().await;

        let result = repo.get_payments("Unknown").await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::AccountNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_payments_empty_for_existing_account() {
        let repo = seeded_repo().await;

        let payments = repo.get_payments("C").await.unwrap();

        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let repo = seeded_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let mut locked = tx.lock_accounts(&ids(&["A", "B"])).await.unwrap();
        assert_eq!(locked.len(), 2);

        locked[0].debit(cents(1000)).unwrap();
        locked[1].credit(cents(1000)).unwrap();
        tx.write_balance(&locked[0]).await.unwrap();
        tx.write_balance(&locked[1]).await.unwrap();
        let payment = tx.append_payment(new_payment("A", "B", 1000)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(balance_of(&repo, "A").await, 9000);
        assert_eq!(balance_of(&repo, "B").await, 2000);

        let history = repo.get_payments("B").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, payment.id);
        assert_eq!(history[0].from, "A");
        assert_eq!(history[0].amount.minor_units(), 1000);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let repo = seeded_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let mut locked = tx.lock_accounts(&ids(&["A", "B"])).await.unwrap();
        locked[0].debit(cents(500)).unwrap();
        tx.write_balance(&locked[0]).await.unwrap();
        tx.append_payment(new_payment("A", "B", 500)).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(balance_of(&repo, "A").await, 10000);
        assert!(repo.get_payments("A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let repo = seeded_repo().await;

        {
            let mut tx = repo.begin().await.unwrap();
            let mut locked = tx.lock_accounts(&ids(&["A"])).await.unwrap();
            locked[0].debit(cents(500)).unwrap();
            tx.write_balance(&locked[0]).await.unwrap();
        }

        assert_eq!(balance_of(&repo, "A").await, 10000);
    }

    #[tokio::test]
    async fn test_lock_accounts_skips_missing() {
        let repo = seeded_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let locked = tx.lock_accounts(&ids(&["A", "Nope"])).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].identifier(), "A");
    }

    #[tokio::test]
    async fn test_write_balance_requires_lock_from_same_transaction() {
        let repo = seeded_repo().await;
        let account = repo.get_accounts(&ids(&["A"])).await.unwrap().remove(0);

        let mut tx = repo.begin().await.unwrap();
        let result = tx.write_balance(&LockedAccount::acquired(account)).await;
        tx.rollback().await.unwrap();

        assert!(matches!(result, Err(RepoError::Transaction(_))));
    }

    #[tokio::test]
    async fn test_append_payment_rejects_unknown_participant() {
        let repo = seeded_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let result = tx.append_payment(new_payment("A", "Ghost", 100)).await;
        tx.rollback().await.unwrap();

        assert!(matches!(result, Err(RepoError::Database(_))));
    }

    #[tokio::test]
    async fn test_storage_rejects_negative_balance() {
        let repo = seeded_repo().await;

        let result = sqlx::query("UPDATE account SET balance = -1 WHERE identifier = 'A'")
            .execute(repo.pool())
            .await;

        assert!(result.is_err());
        assert_eq!(balance_of(&repo, "A").await, 10000);
    }

    /// Moves `amount` under lock, skipping (not failing) when funds are short.
    async fn locked_move(repo: &SqliteRepo, from: &str, to: &str, amount: i64) -> bool {
        let mut tx = repo.begin().await.unwrap();
        let mut locked = tx.lock_accounts(&ids(&[from, to])).await.unwrap();
        let source = locked.iter().position(|l| l.identifier() == from).unwrap();
        let destination = locked.iter().position(|l| l.identifier() == to).unwrap();

        if locked[source].debit(cents(amount)).is_err() {
            tx.rollback().await.unwrap();
            return false;
        }
        locked[destination].credit(cents(amount)).unwrap();
        for account in &locked {
            tx.write_balance(account).await.unwrap();
        }
        tx.append_payment(new_payment(from, to, amount)).await.unwrap();
        tx.commit().await.unwrap();
        true
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_locked_moves_conserve_money() {
        let repo = std::sync::Arc::new(seeded_repo().await);

        let mut handles = Vec::new();
        for i in 0..40 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    locked_move(&repo, "B", "A", 300).await
                } else {
                    locked_move(&repo, "A", "B", 100).await
                }
            }));
        }

        let mut moved = 0;
        for handle in handles {
            if handle.await.unwrap() {
                moved += 1;
            }
        }

        let a = balance_of(&repo, "A").await;
        let b = balance_of(&repo, "B").await;
        assert_eq!(a + b, 11000);
        assert!(a >= 0 && b >= 0);
        assert_eq!(repo.get_payments("A").await.unwrap().len(), moved);
    }
}
