//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more useful failure
//! messages than a bare `assert!`.

use core_kernel::{Money, Notification};
use domain_claims::{Claim, ClaimStatus};
use domain_estimate::{CostRange, Estimate};
use rust_decimal::Decimal;

/// Asserts that two Money values are equal within `tolerance`
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={:?}, expected={:?}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that the amount is a whole multiple of `step`
pub fn assert_multiple_of(money: &Money, step: Decimal) {
    assert!(
        (money.amount() % step).is_zero(),
        "Expected a multiple of {}, got {}",
        step,
        money.amount()
    );
}

/// Asserts `low <= typical <= high`
pub fn assert_cost_range_ordered(range: &CostRange) {
    assert!(
        range.low.amount() <= range.typical.amount() && range.typical.amount() <= range.high.amount(),
        "Cost range out of order: low={}, typical={}, high={}",
        range.low,
        range.typical,
        range.high
    );
}

/// Asserts `subtotal + tax == total` and that the line items sum to the subtotal
pub fn assert_estimate_balanced(estimate: &Estimate) {
    let items: Decimal = estimate.line_items.iter().map(|i| i.total.amount()).sum();
    assert_eq!(
        items,
        estimate.subtotal.amount(),
        "Line items sum to {} but subtotal is {}",
        items,
        estimate.subtotal
    );
    assert_eq!(
        estimate.subtotal.amount() + estimate.tax.amount(),
        estimate.total.amount(),
        "subtotal {} + tax {} != total {}",
        estimate.subtotal,
        estimate.tax,
        estimate.total
    );
}

pub fn assert_claim_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status, expected,
        "Claim {} is {:?}, expected {:?}",
        claim.id, claim.status, expected
    );
}

/// Asserts a notification with `title` was sent
pub fn assert_notified<'a>(sent: &'a [Notification], title: &str) -> &'a Notification {
    sent.iter().find(|n| n.title == title).unwrap_or_else(|| {
        let titles: Vec<&str> = sent.iter().map(|n| n.title.as_str()).collect();
        panic!("No notification titled {:?}; sent: {:?}", title, titles)
    })
}
