//! Store-level tests against a real database.
//!
//! Most behavior is tested at the http route level; these cover guarantees
//! that are easier to check below the api.

use api::store::{self, StoreError, ledger::NewTransaction};
use payloads::{TransactionStatus, TransferType};
use rust_decimal::{Decimal, dec};

use test_helpers::spawn_app;

#[tokio::test]
async fn balance_is_sum_of_transactions() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let account_id = customer.account.id;

    for (amount, transfer_type) in [
        ("100", TransferType::Deposit),
        ("30", TransferType::Withdraw),
        ("0.75", TransferType::Deposit),
    ] {
        app.transfer(account_id, amount, transfer_type).await?;
    }

    let balance = store::ledger::account_balance(&account_id, &app.db_pool).await?;
    assert_eq!(balance, dec!(70.75));

    let sum: Decimal = sqlx::query_scalar(
        "SELECT SUM(amount) FROM transactions WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(&app.db_pool)
    .await?;
    assert_eq!(balance, sum);

    let customer = store::bank::find_customer(&customer.id, &app.db_pool).await?;
    assert_eq!(customer.account.balance, dec!(70.75));

    Ok(())
}

#[tokio::test]
async fn concurrent_resolutions_have_one_winner() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let alice = app.client.user_profile().await?.user_id;

    for _ in 0..5 {
        let transfer = app
            .transfer(customer.account.id, "10", TransferType::Deposit)
            .await?;
        let id = transfer.transaction.id;

        let (approved, declined) = tokio::join!(
            store::approval::approve(&id, &alice, &app.time_source, &app.db_pool),
            store::approval::decline(&id, &alice, &app.time_source, &app.db_pool),
        );

        let (winner, loser) = match (approved, declined) {
            (Ok(_), Err(e)) => (TransactionStatus::Approved, e),
            (Err(e), Ok(_)) => (TransactionStatus::Declined, e),
            (a, d) => panic!("Expected exactly one winner: {a:?} {d:?}"),
        };
        assert!(
            matches!(loser, StoreError::InvalidTransition { from, .. } if from == winner),
            "{loser:?}"
        );

        let status: TransactionStatus =
            sqlx::query_scalar("SELECT status FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_one(&app.db_pool)
                .await?;
        assert_eq!(status, winner);
    }

    Ok(())
}

#[tokio::test]
async fn transactions_are_append_only() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let transfer = app
        .transfer(customer.account.id, "10", TransferType::Deposit)
        .await?;

    let result = sqlx::query("UPDATE transactions SET amount = 99 WHERE id = $1")
        .bind(transfer.transaction.id)
        .execute(&app.db_pool)
        .await;
    assert!(result.is_err());

    let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(transfer.transaction.id)
        .execute(&app.db_pool)
        .await;
    assert!(result.is_err());

    let balance =
        store::ledger::account_balance(&customer.account.id, &app.db_pool)
            .await?;
    assert_eq!(balance, dec!(10));

    Ok(())
}

#[tokio::test]
async fn status_update_rolls_back_with_transaction() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let alice = app.client.user_profile().await?.user_id;

    let mut tx = app.db_pool.begin().await?;
    let transaction = store::ledger::create_transaction(
        NewTransaction {
            account_id: customer.account.id,
            amount: dec!(5),
            description: "rolled back".into(),
            user_id: Some(alice),
        },
        &app.time_source,
        &mut *tx,
    )
    .await?;
    let updated = store::ledger::update_transaction_status(
        &transaction.id,
        &alice,
        TransactionStatus::Approved,
        &app.time_source,
        &mut tx,
    )
    .await?;
    assert_eq!(updated.status, TransactionStatus::Approved);
    tx.rollback().await?;

    let transactions =
        store::ledger::find_pending_transactions_for_user(&alice, &app.db_pool)
            .await?;
    assert!(transactions.is_empty());
    let balance =
        store::ledger::account_balance(&customer.account.id, &app.db_pool)
            .await?;
    assert_eq!(balance, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn pending_is_not_a_target() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let alice = app.client.user_profile().await?.user_id;
    let transfer = app
        .transfer(customer.account.id, "10", TransferType::Deposit)
        .await?;

    let result = store::approval::set_status(
        &transfer.transaction.id,
        &alice,
        TransactionStatus::Pending,
        &app.time_source,
        &app.db_pool,
    )
    .await;
    assert!(matches!(
        result,
        Err(StoreError::InvalidTransition {
            from: TransactionStatus::Pending,
            to: TransactionStatus::Pending,
        })
    ));

    Ok(())
}

#[tokio::test]
async fn duplicate_username_not_unique() -> anyhow::Result<()> {
    let app = spawn_app().await;

    store::user::create_user("carol", "hash", &app.db_pool, &app.time_source)
        .await?;
    let result =
        store::user::create_user("carol", "hash", &app.db_pool, &app.time_source)
            .await;
    assert!(matches!(result, Err(StoreError::NotUnique(_))));

    Ok(())
}
