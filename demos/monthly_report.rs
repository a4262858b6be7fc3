//! Monthly report walkthrough.
//!
//! Slices a transfer history into one calendar month and prints the
//! circularity report for that window, as the accounting backend does
//! for each community every month.

use chrono::{TimeZone, Utc};
use circulation_engine::core::account::AccountId;
use circulation_engine::core::period::ReportPeriod;
use circulation_engine::core::transfer::{Transfer, TransferSet};
use circulation_engine::engine::decomposition::CirculationEngine;
use rust_decimal_macros::dec;

fn main() {
    let june = ReportPeriod::month(2024, 6).expect("valid month");

    let bakery = AccountId::new("bakery");
    let farm = AccountId::new("farm");
    let school = AccountId::new("school");

    let june_10 = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
    let june_20 = Utc.with_ymd_and_hms(2024, 6, 20, 14, 0, 0).unwrap();
    let july_3 = Utc.with_ymd_and_hms(2024, 7, 3, 11, 0, 0).unwrap();

    let mut history = TransferSet::new();
    history.add(Transfer::new(bakery.clone(), farm.clone(), dec!(120)).with_occurred_at(june_10));
    history.add(Transfer::new(farm.clone(), school.clone(), dec!(90)).with_occurred_at(june_10));
    history.add(Transfer::new(school.clone(), bakery.clone(), dec!(90)).with_occurred_at(june_20));
    history.add(Transfer::new(bakery.clone(), school.clone(), dec!(40)).with_occurred_at(july_3));

    println!("Transfer history: {} transfers", history.len());
    println!("Reporting period: {}\n", june);

    let june_transfers = history.in_period(&june);
    println!(
        "{} of {} transfers fall inside the period",
        june_transfers.len(),
        history.len()
    );

    let report = CirculationEngine::decompose_transfers(
        &june_transfers,
        &CirculationEngine::DEFAULT_THRESHOLDS,
    )
    .expect("valid input");

    println!("\n{}", report);
}
