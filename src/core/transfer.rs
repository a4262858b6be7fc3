use crate::core::account::AccountId;
use crate::core::period::ReportPeriod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed value transfer between two accounts.
///
/// Represents the fact that `payer` sent `payee` a specific `amount` of
/// the community currency. This is the atomic unit of the flow graph.
///
/// Transfers are immutable once created. The decomposition engine operates
/// on collections of transfers to compute circularity.
///
/// # Examples
///
/// ```
/// use circulation_engine::core::transfer::Transfer;
/// use circulation_engine::core::account::AccountId;
/// use rust_decimal_macros::dec;
///
/// let transfer = Transfer::new(
///     AccountId::new("0x3f2a-bakery"),
///     AccountId::new("0x91cc-school"),
///     dec!(250),
/// );
///
/// assert_eq!(transfer.amount(), dec!(250));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier for this transfer.
    id: Uuid,
    /// The account that sent the amount.
    payer: AccountId,
    /// The account that received the amount.
    payee: AccountId,
    /// The amount transferred. Must be positive.
    amount: Decimal,
    /// When this transfer record was created.
    created_at: DateTime<Utc>,
    /// When the transfer happened on chain, if known.
    occurred_at: Option<DateTime<Utc>>,
    /// Optional transaction hash or memo.
    reference: Option<String>,
}

impl Transfer {
    /// Create a new transfer.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive.
    pub fn new(payer: AccountId, payee: AccountId, amount: Decimal) -> Self {
        assert!(
            amount > Decimal::ZERO,
            "Transfer amount must be positive, got {}",
            amount
        );
        Self {
            id: Uuid::new_v4(),
            payer,
            payee,
            amount,
            created_at: Utc::now(),
            occurred_at: None,
            reference: None,
        }
    }

    /// Create a transfer with a specific ID (useful for testing / determinism).
    pub fn with_id(id: Uuid, payer: AccountId, payee: AccountId, amount: Decimal) -> Self {
        assert!(amount > Decimal::ZERO);
        Self {
            id,
            payer,
            payee,
            amount,
            created_at: Utc::now(),
            occurred_at: None,
            reference: None,
        }
    }

    /// Set the on-chain timestamp.
    pub fn with_occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Set a reference string (transaction hash or memo).
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payer(&self) -> &AccountId {
        &self.payer
    }

    pub fn payee(&self) -> &AccountId {
        &self.payee
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// A collection of transfers that can be submitted to the decomposition engine.
///
/// Typically holds every transfer observed in one reporting window,
/// as supplied by the upstream transaction aggregation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferSet {
    transfers: Vec<Transfer>,
}

impl TransferSet {
    pub fn new() -> Self {
        Self {
            transfers: Vec::new(),
        }
    }

    pub fn add(&mut self, transfer: Transfer) {
        self.transfers.push(transfer);
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Total gross value of all transfers.
    pub fn gross_total(&self) -> Decimal {
        self.transfers.iter().map(|t| t.amount()).sum()
    }

    /// All unique accounts referenced in this set.
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self
            .transfers
            .iter()
            .flat_map(|t| vec![t.payer().clone(), t.payee().clone()])
            .collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }

    /// The subset of transfers whose on-chain timestamp falls inside `period`.
    ///
    /// Transfers without an on-chain timestamp are excluded.
    pub fn in_period(&self, period: &ReportPeriod) -> TransferSet {
        self.transfers
            .iter()
            .filter(|t| t.occurred_at().is_some_and(|at| period.contains(at)))
            .cloned()
            .collect()
    }
}

impl FromIterator<Transfer> for TransferSet {
    fn from_iter<T: IntoIterator<Item = Transfer>>(iter: T) -> Self {
        Self {
            transfers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_transfer() -> Transfer {
        Transfer::new(AccountId::new("A"), AccountId::new("B"), dec!(1000))
    }

    #[test]
    fn test_transfer_creation() {
        let t = sample_transfer();
        assert_eq!(t.payer().as_str(), "A");
        assert_eq!(t.payee().as_str(), "B");
        assert_eq!(t.amount(), dec!(1000));
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_transfer_zero_amount() {
        Transfer::new(AccountId::new("A"), AccountId::new("B"), Decimal::ZERO);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_transfer_negative_amount() {
        Transfer::new(AccountId::new("A"), AccountId::new("B"), dec!(-100));
    }

    #[test]
    fn test_transfer_set_gross() {
        let mut set = TransferSet::new();
        set.add(Transfer::new(
            AccountId::new("A"),
            AccountId::new("B"),
            dec!(100),
        ));
        set.add(Transfer::new(
            AccountId::new("B"),
            AccountId::new("C"),
            dec!(200),
        ));
        assert_eq!(set.gross_total(), dec!(300));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_transfer_set_accounts() {
        let mut set = TransferSet::new();
        set.add(Transfer::new(
            AccountId::new("A"),
            AccountId::new("B"),
            dec!(100),
        ));
        set.add(Transfer::new(
            AccountId::new("B"),
            AccountId::new("C"),
            dec!(200),
        ));
        let accounts = set.accounts();
        assert_eq!(accounts.len(), 3);
    }

    #[test]
    fn test_in_period_filters_by_timestamp() {
        use chrono::TimeZone;

        let period = ReportPeriod::month(2024, 6).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

        let mut set = TransferSet::new();
        set.add(
            Transfer::new(AccountId::new("A"), AccountId::new("B"), dec!(10))
                .with_occurred_at(inside),
        );
        set.add(
            Transfer::new(AccountId::new("B"), AccountId::new("C"), dec!(20))
                .with_occurred_at(outside),
        );
        // No timestamp: excluded
        set.add(Transfer::new(AccountId::new("C"), AccountId::new("A"), dec!(30)));

        let filtered = set.in_period(&period);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.gross_total(), dec!(10));
    }
}
