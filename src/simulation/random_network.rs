//! Random transfer network generation.
//!
//! Produces randomized transfer sets to stress the decomposition engine
//! and to feed the benchmarks and the CLI `generate` command.

use crate::core::account::AccountId;
use crate::core::transfer::{Transfer, TransferSet};
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random transfer network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Number of accounts in the network.
    pub account_count: usize,
    /// Average number of transfers per account.
    pub avg_transfers_per_account: usize,
    /// Minimum transfer amount.
    pub min_amount: Decimal,
    /// Maximum transfer amount.
    pub max_amount: Decimal,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            account_count: 10,
            avg_transfers_per_account: 3,
            min_amount: Decimal::from(10),
            max_amount: Decimal::from(10_000),
        }
    }
}

/// Generate a random transfer network for testing.
pub fn generate_random_network(config: &NetworkConfig) -> TransferSet {
    let mut rng = rand::thread_rng();
    let mut set = TransferSet::new();

    let accounts: Vec<AccountId> = (0..config.account_count)
        .map(|i| AccountId::new(format!("ACCT-{:03}", i)))
        .collect();

    let total_transfers = config.account_count * config.avg_transfers_per_account;

    for _ in 0..total_transfers {
        let payer_idx = rng.gen_range(0..accounts.len());
        let mut payee_idx = rng.gen_range(0..accounts.len());
        while payee_idx == payer_idx {
            payee_idx = rng.gen_range(0..accounts.len());
        }

        let min_f64: f64 = config.min_amount.to_string().parse().unwrap_or(10.0);
        let max_f64: f64 = config.max_amount.to_string().parse().unwrap_or(10_000.0);
        let amount_f64 = rng.gen_range(min_f64..max_f64);
        let amount = Decimal::from_f64_retain(amount_f64)
            .unwrap_or(Decimal::from(10))
            .round_dp(2);

        if amount > Decimal::ZERO {
            set.add(Transfer::new(
                accounts[payer_idx].clone(),
                accounts[payee_idx].clone(),
                amount,
            ));
        }
    }

    set
}
