// Wallet ledger and escrow settlement tests - no queue, no HTTP

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use skillblitz_service::assets::AssetTable;
use skillblitz_service::config::{DrawPolicy, ServiceConfig};
use skillblitz_service::escrow::settlement::{compute_settlement, match_totals};
use skillblitz_service::escrow::EscrowManager;
use skillblitz_service::wallet::{Wallet, WalletManager};
use skillblitz_service::{Asset, CoreError, GameResult};

fn escrow_with(config: &ServiceConfig) -> (Arc<WalletManager>, EscrowManager) {
    let wallets = Arc::new(WalletManager::new(Duration::ZERO));
    let escrow = EscrowManager::new(wallets.clone(), AssetTable::default(), config);
    (wallets, escrow)
}

#[test]
fn test_connect_seeds_starting_allocation() {
    let mut wallet = Wallet::default();
    assert!(!wallet.connected);
    assert_eq!(wallet.balance(Asset::USDT), dec!(0));

    wallet.connect();
    assert!(wallet.connected);
    assert!(wallet.address.as_deref().unwrap().starts_with("0x"));
    assert_eq!(wallet.balance(Asset::USDT), dec!(100));
    assert_eq!(wallet.balance(Asset::ETH), dec!(0.2));
    assert_eq!(wallet.balance(Asset::TON), dec!(50));
}

#[test]
fn test_connect_is_idempotent() {
    let mut wallet = Wallet::default();
    wallet.connect();
    let address = wallet.address.clone();
    assert_ok!(wallet.debit(Asset::USDT, dec!(30)));

    wallet.connect();
    assert_eq!(wallet.address, address);
    assert_eq!(wallet.balance(Asset::USDT), dec!(70), "reconnect must not re-seed balances");
}

#[test]
fn test_disconnect_resets_wallet() {
    let mut wallet = Wallet::default();
    wallet.connect();
    wallet.disconnect();

    assert_eq!(wallet, Wallet::default());
    assert!(wallet.address.is_none());
    for asset in Asset::ALL {
        assert_eq!(wallet.balance(asset), dec!(0));
    }
}

#[test]
fn test_overdraft_leaves_balance_untouched() {
    let mut wallet = Wallet::default();
    wallet.connect();

    let err = assert_err!(wallet.debit(Asset::USDT, dec!(100.01)));
    assert_eq!(err, CoreError::InsufficientFunds {
        asset: Asset::USDT,
        requested: dec!(100.01),
        available: dec!(100),
    });
    assert_eq!(wallet.balance(Asset::USDT), dec!(100));
}

#[test]
fn test_debit_exact_balance_reaches_zero() {
    let mut wallet = Wallet::default();
    wallet.connect();

    let remaining = assert_ok!(wallet.debit(Asset::TON, dec!(50)));
    assert_eq!(remaining, dec!(0));
    assert_eq!(wallet.balance(Asset::TON), dec!(0));
}

#[test]
fn test_negative_amounts_rejected() {
    let mut wallet = Wallet::default();
    wallet.connect();

    assert_eq!(wallet.debit(Asset::USDT, dec!(-1)), Err(CoreError::InvalidAmount(dec!(-1))));
    assert_eq!(wallet.credit(Asset::USDT, dec!(-1)), Err(CoreError::InvalidAmount(dec!(-1))));
    assert_eq!(wallet.balance(Asset::USDT), dec!(100));
}

#[test]
fn test_credit_works_on_disconnected_wallet() {
    let mut wallet = Wallet::default();
    assert_eq!(assert_ok!(wallet.credit(Asset::ETH, dec!(0.5))), dec!(0.5));
}

#[test]
fn test_win_settlement_splits_pot_exactly() {
    for stake in [dec!(5), dec!(20), dec!(50), dec!(100), dec!(0.07), dec!(12.345)] {
        let s = compute_settlement(stake, dec!(0.03), GameResult::Win, DrawPolicy::RefundStake);
        let pot = stake * dec!(2);

        assert_eq!(s.fee, pot * dec!(0.03));
        assert_eq!(s.payout, pot * (dec!(1) - dec!(0.03)));
        assert_eq!(s.payout + s.fee, pot, "payout + fee must equal the pot for stake {}", stake);
        assert_eq!(s.net_profit, s.payout - stake);
    }
}

#[test]
fn test_loss_settlement_pays_nothing() {
    let s = compute_settlement(dec!(20), dec!(0.03), GameResult::Loss, DrawPolicy::RefundStake);
    assert_eq!(s.payout, dec!(0));
    assert_eq!(s.fee, dec!(1.2));
    assert_eq!(s.net_profit, dec!(-20));
}

#[test]
fn test_draw_policies() {
    let refund = compute_settlement(dec!(20), dec!(0.03), GameResult::Draw, DrawPolicy::RefundStake);
    assert_eq!(refund.payout, dec!(20));
    assert_eq!(refund.fee, dec!(0));
    assert_eq!(refund.net_profit, dec!(0));

    let split = compute_settlement(dec!(20), dec!(0.03), GameResult::Draw, DrawPolicy::SplitPot);
    assert_eq!(split.payout, dec!(19.4));
    assert_eq!(split.fee, dec!(0.6));
    assert_eq!(split.net_profit, dec!(-0.6));

    assert_eq!(match_totals(dec!(20), dec!(0.03), false, DrawPolicy::SplitPot), (dec!(38.8), dec!(1.2)));
    assert_eq!(match_totals(dec!(20), dec!(0.03), true, DrawPolicy::SplitPot), (dec!(19.4), dec!(1.2)));
    assert_eq!(match_totals(dec!(20), dec!(0.03), true, DrawPolicy::RefundStake), (dec!(20), dec!(0)));
}

#[test]
fn test_network_fee_per_asset() {
    let (_, escrow) = escrow_with(&ServiceConfig::default());

    assert_eq!(escrow.get_estimated_network_fee(Asset::USDT), dec!(0.25));
    assert_eq!(escrow.get_estimated_network_fee(Asset::ETH), dec!(0.0001));
    // TON is listed but not available yet
    assert_eq!(escrow.get_estimated_network_fee(Asset::TON), dec!(0));
}

#[tokio::test]
async fn test_lock_funds_without_balance_does_nothing() {
    let (wallets, escrow) = escrow_with(&ServiceConfig::default());
    wallets.connect("alice").await;

    let err = escrow.lock_funds(Uuid::new_v4(), "alice", Asset::USDT, dec!(100)).await;
    assert!(matches!(err, Err(CoreError::InsufficientFunds { .. })));
    assert_eq!(wallets.balance("alice", Asset::USDT).await, dec!(100));
}

#[tokio::test]
async fn test_lock_then_win_scenario() {
    let (wallets, escrow) = escrow_with(&ServiceConfig::default());
    wallets.connect("alice").await;
    let match_id = Uuid::new_v4();

    let locked = escrow.lock_funds(match_id, "alice", Asset::USDT, dec!(20)).await.unwrap();
    assert_eq!(locked, dec!(20.25));
    assert_eq!(wallets.balance("alice", Asset::USDT).await, dec!(79.75));

    let s = escrow.settle_match(match_id, "alice", Asset::USDT, dec!(20), GameResult::Win).await.unwrap();
    assert_eq!(s.fee, dec!(1.2));
    assert_eq!(s.payout, dec!(38.8));
    assert_eq!(wallets.balance("alice", Asset::USDT).await, dec!(118.55));

    let fees = escrow.fees_collected().await;
    assert_eq!(fees.get(&Asset::USDT), Some(&dec!(1.2)));
}

#[tokio::test]
async fn test_loss_does_not_credit_or_collect() {
    let (wallets, escrow) = escrow_with(&ServiceConfig::default());
    wallets.connect("bob").await;
    let match_id = Uuid::new_v4();

    escrow.lock_funds(match_id, "bob", Asset::USDT, dec!(20)).await.unwrap();
    escrow.settle_match(match_id, "bob", Asset::USDT, dec!(20), GameResult::Loss).await.unwrap();

    assert_eq!(wallets.balance("bob", Asset::USDT).await, dec!(79.75));
    assert!(escrow.fees_collected().await.is_empty());
}

#[tokio::test]
async fn test_draw_refund_returns_stake_only() {
    let (wallets, escrow) = escrow_with(&ServiceConfig::default());
    wallets.connect("carol").await;
    let match_id = Uuid::new_v4();

    escrow.lock_funds(match_id, "carol", Asset::USDT, dec!(20)).await.unwrap();
    escrow.settle_match(match_id, "carol", Asset::USDT, dec!(20), GameResult::Draw).await.unwrap();

    // network fee is spent either way
    assert_eq!(wallets.balance("carol", Asset::USDT).await, dec!(99.75));
}

#[tokio::test]
async fn test_split_pot_draw_collects_half_fee_per_player() {
    let config = ServiceConfig {
        draw_policy: DrawPolicy::SplitPot,
        ..ServiceConfig::default()
    };
    let (wallets, escrow) = escrow_with(&config);
    wallets.connect("dave").await;
    wallets.connect("erin").await;
    let match_id = Uuid::new_v4();

    for player in ["dave", "erin"] {
        escrow.lock_funds(match_id, player, Asset::USDT, dec!(20)).await.unwrap();
        escrow.settle_match(match_id, player, Asset::USDT, dec!(20), GameResult::Draw).await.unwrap();
        assert_eq!(wallets.balance(player, Asset::USDT).await, dec!(99.15));
    }

    assert_eq!(escrow.fees_collected().await.get(&Asset::USDT), Some(&dec!(1.2)));
}
