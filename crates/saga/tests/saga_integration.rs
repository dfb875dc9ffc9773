//! End-to-end saga tests against the in-memory store and fake gateway.

use balance::{InMemoryBalanceGateway, STATUS_BLOCKED};
use common::{Money, OrderId, ProductId};
use domain::{OrderStatus, Product};
use saga::{OrderError, OrderSaga};
use store::{InMemoryOrderStore, OrderStore};
use std::sync::Arc;

async fn setup(stock: u32) -> (
    Arc<OrderSaga<InMemoryOrderStore, InMemoryBalanceGateway>>,
    InMemoryOrderStore,
    InMemoryBalanceGateway,
) {
    let store = InMemoryOrderStore::new();
    store
        .seed_products(vec![
            Product::new("prod-001", "Premium Smartphone", Money::from_cents(1000), "USD", stock),
            Product::new("prod-002", "Wireless Headphones", Money::from_cents(1499), "USD", 78),
        ])
        .await
        .unwrap();

    let gateway = InMemoryBalanceGateway::new();
    let saga = Arc::new(OrderSaga::new(store.clone(), gateway.clone()));
    (saga, store, gateway)
}

#[tokio::test]
async fn full_lifecycle_create_then_complete() {
    let (saga, store, gateway) = setup(10).await;

    let block = saga.create_order("prod-001", 2).await.unwrap();
    assert_eq!(block.pre_order.status, STATUS_BLOCKED);
    assert_eq!(block.pre_order.amount, Money::from_cents(2000));
    assert_eq!(block.updated_balance.blocked_balance, Money::from_cents(2000));

    let completion = saga.complete_order(OrderId::new(1)).await.unwrap();
    assert_eq!(completion.order.status, "Completed");
    assert_eq!(completion.updated_balance.total_balance, Money::from_cents(98_000));

    assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(8));
    assert_eq!(gateway.block_count(), 0);
}

#[tokio::test]
async fn failed_block_leaves_net_zero_inventory_change() {
    let (saga, store, gateway) = setup(10).await;
    gateway.set_fail_on_block(true);

    for _ in 0..3 {
        let err = saga.create_order("prod-001", 4).await.unwrap_err();
        assert!(matches!(err, OrderError::ExternalService(_)));
    }

    // Every attempt was compensated; inventory is back where it started.
    assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(10));
    assert_eq!(store.order_count().await, 3);
    for id in 1..=3 {
        let order = store.get_order(OrderId::new(id)).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }
}

#[tokio::test]
async fn concurrent_creates_for_more_than_stock_one_winner() {
    let (saga, store, _) = setup(10).await;

    let a = {
        let saga = saga.clone();
        tokio::spawn(async move { saga.create_order("prod-001", 6).await })
    };
    let b = {
        let saga = saga.clone();
        tokio::spawn(async move { saga.create_order("prod-001", 6).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one reservation can fit");

    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(loser.as_ref().unwrap_err(), OrderError::Validation(_)));

    // Final stock = initial minus only the winning quantity.
    assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(4));
}

#[tokio::test]
async fn orders_on_different_products_are_independent() {
    let (saga, store, _) = setup(10).await;

    saga.create_order("prod-001", 2).await.unwrap();
    saga.create_order("prod-002", 1).await.unwrap();

    assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(8));
    assert_eq!(store.stock_of(&ProductId::new("prod-002")).await, Some(77));

    // Compensating one order does not touch the other product.
    saga.cancel_order(OrderId::new(1)).await.unwrap();
    assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(10));
    assert_eq!(store.stock_of(&ProductId::new("prod-002")).await, Some(77));
}

#[tokio::test]
async fn amount_is_frozen_at_creation_time() {
    let (saga, store, _) = setup(10).await;

    saga.create_order("prod-001", 2).await.unwrap();

    // Reprice the product after the order exists.
    store
        .seed_products(vec![Product::new(
            "prod-001",
            "Premium Smartphone",
            Money::from_cents(9999),
            "USD",
            8,
        )])
        .await
        .unwrap();

    let completion = saga.complete_order(OrderId::new(1)).await.unwrap();
    assert_eq!(completion.order.amount, Money::from_cents(2000));
}
