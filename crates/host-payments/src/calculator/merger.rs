use crate::calculator::{allocator::PaymentRecord, money};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::info;

/// Combine payments to the same address into one
///
/// Output keeps the order in which each address was first seen. A merged
/// record carries the summed amount and the first record's memo; addresses
/// paid once pass through untouched. Payable and deferred batches must be
/// merged separately.
pub fn merge(records: &[PaymentRecord]) -> Vec<PaymentRecord> {
    let mut groups: IndexMap<&str, Vec<&PaymentRecord>> = IndexMap::new();
    for record in records {
        groups.entry(record.address.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(address, group)| match group.as_slice() {
            [single] => (*single).clone(),
            _ => {
                let amount = money::round(group.iter().map(|r| r.amount).sum::<Decimal>());
                info!(
                    "Merging {} payments to {address}: {}",
                    group.len(),
                    money::to_fixed(amount)
                );
                PaymentRecord {
                    address: address.to_string(),
                    amount,
                    memo: group[0].memo.clone(),
                }
            }
        })
        .collect()
}

/// Total paid to each address, in first-seen order
pub fn totals_by_address(records: &[PaymentRecord]) -> IndexMap<String, Decimal> {
    let mut totals: IndexMap<String, Decimal> = IndexMap::new();
    for record in records {
        *totals.entry(record.address.clone()).or_default() += record.amount;
    }
    totals
}
