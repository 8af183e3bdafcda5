use payloads::{
    AccountId, CustomerId, TransactionStatus, TransferType, requests,
};
use reqwest::StatusCode;
use rust_decimal::dec;

use test_helpers::{assert_status_code, spawn_app};

#[tokio::test]
async fn deposit_and_withdraw_signs() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;

    let deposit = app
        .transfer(customer.account.id, "25.50", TransferType::Deposit)
        .await?;
    assert_eq!(deposit.transaction.amount, dec!(25.50));
    assert_eq!(deposit.transaction.status, TransactionStatus::Pending);
    assert_eq!(deposit.transaction.account_id, customer.account.id);
    assert_eq!(deposit.customer.id, customer.id);
    assert_eq!(deposit.customer.account.balance, dec!(25.50));

    let withdrawal = app
        .transfer(customer.account.id, "5", TransferType::Withdraw)
        .await?;
    assert_eq!(withdrawal.transaction.amount, dec!(-5));
    assert_eq!(withdrawal.customer.account.balance, dec!(20.50));

    Ok(())
}

#[tokio::test]
async fn balance_counts_every_transaction() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let account_id = customer.account.id;

    app.transfer(account_id, "100", TransferType::Deposit).await?;
    let first_withdrawal = app
        .transfer(account_id, "30", TransferType::Withdraw)
        .await?;
    app.client
        .approve_transaction(&first_withdrawal.transaction.id)
        .await?;
    // left pending, still counted
    app.transfer(account_id, "20", TransferType::Withdraw).await?;

    let customer = app.client.get_customer(&customer.id).await?;
    assert_eq!(customer.account.balance, dec!(50));

    Ok(())
}

/// A create_transfer body with only the required fields.
#[derive(serde::Serialize)]
struct MinimalTransfer {
    account_id: AccountId,
    amount: String,
}

#[tokio::test]
async fn transfer_defaults_to_deposit() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;

    let body = MinimalTransfer {
        account_id: customer.account.id,
        amount: "12".into(),
    };
    let result = app
        .client
        .inner_client
        .post(format!("{}/api/create_transfer", app.client.address))
        .json(&body)
        .send()
        .await?
        .json::<payloads::responses::TransferResult>()
        .await?;
    assert_eq!(result.transaction.amount, dec!(12));
    assert_eq!(result.transaction.description, "");

    Ok(())
}

#[tokio::test]
async fn invalid_amounts_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;

    for amount in ["abc", "0", "-10", "1.234", ""] {
        let body = requests::CreateTransfer {
            account_id: customer.account.id,
            amount: amount.into(),
            transfer_type: TransferType::Deposit,
            description: String::new(),
        };
        let result = app.client.create_transfer(&body).await;
        assert_status_code(result, StatusCode::BAD_REQUEST);
    }

    // nothing was recorded
    let transactions = app
        .client
        .list_account_transactions(&customer.account.id, 10, 0)
        .await?;
    assert!(transactions.is_empty());

    Ok(())
}

#[tokio::test]
async fn transfer_to_missing_account() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_bank_with_customer().await?;

    let body = requests::CreateTransfer {
        account_id: AccountId(9999),
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: String::new(),
    };
    let result = app.client.create_transfer(&body).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn account_checked_before_amount() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_bank_with_customer().await?;
    let (_, bob_customer) = app.create_bob_bank_with_customer().await?;

    let body = requests::CreateTransfer {
        account_id: AccountId(9999),
        amount: "abc".into(),
        transfer_type: TransferType::Deposit,
        description: String::new(),
    };
    let result = app.client.create_transfer(&body).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    let body = requests::CreateTransfer {
        account_id: bob_customer.account.id,
        ..body
    };
    let result = app.client.create_transfer(&body).await;
    assert_status_code(result, StatusCode::FORBIDDEN);

    // bob's account is untouched
    app.login_bob().await?;
    assert!(app.client.pending_transactions().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn anonymous_transfer_is_unattributed() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    app.client.logout().await?;

    let result = app
        .transfer(customer.account.id, "7", TransferType::Deposit)
        .await?;
    assert_eq!(result.transaction.user_id, None);

    // it still shows up for the bank's users
    app.login_alice().await?;
    let pending = app.client.pending_transactions().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, result.transaction.id);

    // declining resolves it but leaves it in the balance
    let pending = app
        .client
        .decline_transaction(&result.transaction.id)
        .await?;
    assert!(pending.is_empty());
    let customer = app.client.get_customer(&customer.id).await?;
    assert_eq!(customer.account.balance, dec!(7));

    Ok(())
}

#[tokio::test]
async fn transfer_into_other_bank_forbidden() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_bank_with_customer().await?;
    let (_, bob_customer) = app.create_bob_bank_with_customer().await?;

    let body = requests::CreateTransfer {
        account_id: bob_customer.account.id,
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: "not mine".into(),
    };
    let result = app.client.create_transfer(&body).await;
    assert_status_code(result, StatusCode::FORBIDDEN);

    let result = app
        .client
        .list_account_transactions(&bob_customer.account.id, 10, 0)
        .await;
    assert_status_code(result, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn bulk_transfer_fans_out() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (bank, first) = app.create_alice_bank_with_customer().await?;
    let second = app.create_test_customer(bank.id, "Kim", "Lee").await?;
    let third = app.create_test_customer(bank.id, "Max", "Park").await?;

    let body = requests::BulkTransfer {
        customer_ids: vec![first.id, second.id, third.id],
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: "allowance".into(),
    };
    let result = app.client.bulk_transfer(&body).await?;

    assert_eq!(result.customer.id, first.id);
    assert_eq!(result.customer.account.balance, dec!(10));
    assert_eq!(result.bank, bank);
    assert_eq!(result.transactions.len(), 3);
    let accounts = result
        .transactions
        .iter()
        .map(|t| t.account_id)
        .collect::<Vec<_>>();
    assert_eq!(
        accounts,
        vec![first.account.id, second.account.id, third.account.id]
    );
    for transaction in &result.transactions {
        assert_eq!(transaction.amount, dec!(10));
        assert_eq!(transaction.status, TransactionStatus::Pending);
        assert_eq!(transaction.description, "allowance");
    }

    let pending = app.client.pending_transactions().await?;
    assert_eq!(pending.len(), 3);

    Ok(())
}

#[tokio::test]
async fn bulk_withdraw_with_duplicates() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;

    let body = requests::BulkTransfer {
        customer_ids: vec![customer.id, customer.id],
        amount: "2.25".into(),
        transfer_type: TransferType::Withdraw,
        description: String::new(),
    };
    let result = app.client.bulk_transfer(&body).await?;
    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.customer.account.balance, dec!(-4.50));

    Ok(())
}

#[tokio::test]
async fn bulk_transfer_rejects_empty_target_set() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_bank_with_customer().await?;

    let body = requests::BulkTransfer {
        customer_ids: vec![],
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: String::new(),
    };
    let result = app.client.bulk_transfer(&body).await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn bulk_transfer_is_all_or_nothing() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let (_, bob_customer) = app.create_bob_bank_with_customer().await?;

    // a missing customer after a valid one
    let body = requests::BulkTransfer {
        customer_ids: vec![customer.id, CustomerId(9999)],
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: String::new(),
    };
    let result = app.client.bulk_transfer(&body).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    // a customer of another bank
    let body = requests::BulkTransfer {
        customer_ids: vec![customer.id, bob_customer.id],
        ..body
    };
    let result = app.client.bulk_transfer(&body).await;
    assert_status_code(result, StatusCode::FORBIDDEN);

    // a bad amount
    let body = requests::BulkTransfer {
        customer_ids: vec![customer.id],
        amount: "ten".into(),
        ..body
    };
    let result = app.client.bulk_transfer(&body).await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    assert!(app.client.pending_transactions().await?.is_empty());
    let customer = app.client.get_customer(&customer.id).await?;
    assert_eq!(customer.account.balance, dec!(0));

    Ok(())
}

#[tokio::test]
async fn bulk_transfer_requires_login() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    app.client.logout().await?;

    let body = requests::BulkTransfer {
        customer_ids: vec![customer.id],
        amount: "10".into(),
        transfer_type: TransferType::Deposit,
        description: String::new(),
    };
    let result = app.client.bulk_transfer(&body).await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn account_transactions_paginate_newest_first() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let (_, customer) = app.create_alice_bank_with_customer().await?;
    let account_id = customer.account.id;

    for amount in ["1", "2", "3"] {
        app.transfer(account_id, amount, TransferType::Deposit)
            .await?;
    }

    let page = app
        .client
        .list_account_transactions(&account_id, 2, 0)
        .await?;
    let amounts = page.iter().map(|t| t.amount).collect::<Vec<_>>();
    assert_eq!(amounts, vec![dec!(3), dec!(2)]);

    let page = app
        .client
        .list_account_transactions(&account_id, 2, 2)
        .await?;
    let amounts = page.iter().map(|t| t.amount).collect::<Vec<_>>();
    assert_eq!(amounts, vec![dec!(1)]);

    Ok(())
}
