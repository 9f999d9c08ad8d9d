use crate::calculator::{money, registry::OwnershipEntry};
use base64::{Engine, engine::general_purpose::STANDARD};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Payment memos are a u64 in the wallet's batch format
pub const MEMO_MAX_BYTES: usize = 8;

/// Memo attached to every payment, base64 encoded as the wallet expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMemo {
    text: String,
    encoded: String,
    truncated: bool,
}

impl PaymentMemo {
    /// Truncates to at most 8 bytes without splitting a character
    pub fn new(raw: &str) -> Self {
        let mut end = raw.len().min(MEMO_MAX_BYTES);
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        let text = &raw[..end];
        Self {
            text: text.to_string(),
            encoded: STANDARD.encode(text.as_bytes()),
            truncated: end < raw.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

/// One entry of a batch payment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct PaymentRecord {
    pub address: String,
    #[serde(with = "money::fixed")]
    pub amount: Decimal,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payment {
    /// Valid wallet and at least the payment minimum
    Payable(PaymentRecord),
    /// Invalid or missing wallet, or under the payment minimum
    Deferred(PaymentRecord),
}

impl Payment {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            Self::Payable(record) | Self::Deferred(record) => record,
        }
    }

    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Payable(_))
    }
}

/// Result of splitting one entry's gross earnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub net_earnings: Decimal,
    pub host_earnings: Decimal,
    pub wallet_valid: bool,
    pub below_minimum: bool,
    /// Absent when the host earned nothing
    pub payment: Option<Payment>,
}

impl Allocation {
    /// Store the computed figures on the entry for the end-of-run snapshot
    pub fn record_on(&self, entry: &mut OwnershipEntry) {
        entry.net_earnings = Some(self.net_earnings);
        entry.host_earnings = Some(self.host_earnings);
        entry.host_wallet_validated = Some(self.wallet_valid);
    }
}

#[derive(Debug, Clone)]
pub struct PaymentAllocator {
    minimum: Decimal,
    memo: PaymentMemo,
}

impl PaymentAllocator {
    pub fn new(minimum: Decimal, memo: PaymentMemo) -> Self {
        Self { minimum, memo }
    }

    pub fn memo(&self) -> &PaymentMemo {
        &self.memo
    }

    pub fn minimum(&self) -> Decimal {
        self.minimum
    }

    /// Split an entry's earnings into the host's share and classify the payment
    ///
    /// Both products are computed exactly and each is rounded to 8 places
    /// once. Classification uses the rounded host share, so the amount
    /// written out is the amount that was compared to the minimum.
    pub fn allocate(&self, entry: &OwnershipEntry) -> Allocation {
        let net_exact = entry.gross_earnings * entry.gross_share;
        let host_exact = net_exact * entry.net_share;
        let net_earnings = money::round(net_exact);
        let host_earnings = money::round(host_exact);
        let wallet_valid = entry.has_valid_wallet();
        let below_minimum = host_earnings < self.minimum;

        let payment = (host_earnings > Decimal::ZERO).then(|| {
            let address = match (&entry.host_wallet, wallet_valid) {
                (Some(wallet), true) => wallet.clone(),
                _ => format!("{} hosted by {}", entry.hotspot_name, entry.host_name),
            };
            let record = PaymentRecord {
                address,
                amount: host_earnings,
                memo: self.memo.encoded().to_string(),
            };
            if wallet_valid && !below_minimum {
                Payment::Payable(record)
            } else {
                Payment::Deferred(record)
            }
        });

        Allocation {
            net_earnings,
            host_earnings,
            wallet_valid,
            below_minimum,
            payment,
        }
    }
}
