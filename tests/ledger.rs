mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::MemoryStore;
use cupsmeter::ledger::BudgetLedger;

const USER: &str = "users/u1";

fn ledger_over(store: &MemoryStore) -> BudgetLedger {
    BudgetLedger::new(Arc::new(store.clone()), USER.to_string(), Duration::from_secs(30))
}

#[test]
fn second_read_within_ttl_is_served_from_cache() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.balance(false), dec!(50));
    assert_eq!(ledger.balance(false), dec!(50));
    assert_eq!(store.reads(), 1);
}

#[test]
fn force_refresh_bypasses_the_cache() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    let mut ledger = ledger_over(&store);

    ledger.balance(false);
    ledger.balance(true);
    assert_eq!(store.reads(), 2);
}

#[test]
fn read_failure_denies_with_zero() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    store.state().fail_reads = true;
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.balance(false), Decimal::ZERO);
}

#[test]
fn missing_record_reads_as_zero() {
    let store = MemoryStore::default();
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.balance(false), Decimal::ZERO);
}

#[test]
fn deduct_clamps_at_zero_by_default() {
    let store = MemoryStore::with_balance(USER, dec!(5));
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.deduct(dec!(10), false), Some(dec!(0)));
    assert_eq!(store.balance_at(USER), dec!(0));
}

#[test]
fn deduct_can_go_negative_when_allowed() {
    let store = MemoryStore::with_balance(USER, dec!(10));
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.deduct(dec!(24), true), Some(dec!(-14)));
    assert_eq!(store.balance_at(USER), dec!(-14));
}

#[test]
fn deduct_writes_through_to_the_cache() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.deduct(dec!(10), false), Some(dec!(40)));
    let reads_after_deduct = store.reads();

    // A rapid next job sees the debited balance without a remote read.
    assert_eq!(ledger.balance(false), dec!(40));
    assert_eq!(store.reads(), reads_after_deduct);
}

#[test]
fn deduct_always_force_refreshes_first() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    let mut ledger = ledger_over(&store);
    ledger.balance(false);

    // Another workstation changed the remote balance inside our TTL.
    store.state().data.insert(USER.to_string(), serde_json::json!({ "print_balance": dec!(20) }));

    assert_eq!(ledger.deduct(dec!(10), false), Some(dec!(10)));
    assert_eq!(store.balance_at(USER), dec!(10));
}

#[test]
fn failed_refresh_aborts_the_deduction() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    store.state().fail_reads = true;
    let mut ledger = ledger_over(&store);

    // Deducting from the fail-closed zero would clobber the real balance.
    assert_eq!(ledger.deduct(dec!(10), true), None);
    assert_eq!(store.balance_at(USER), dec!(50));
}

#[test]
fn failed_write_deducts_nothing() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    store.state().fail_writes = true;
    let mut ledger = ledger_over(&store);

    assert_eq!(ledger.deduct(dec!(10), false), None);
    assert_eq!(store.balance_at(USER), dec!(50));
}

#[test]
fn deduct_updates_the_timestamp_field() {
    let store = MemoryStore::with_balance(USER, dec!(50));
    let mut ledger = ledger_over(&store);
    ledger.deduct(dec!(10), false);

    let state = store.state();
    assert!(state.data[USER].get("balance_updated_at").is_some());
}
