use crate::{
    calculator::{
        diagnostics::{Diagnostic, DiagnosticKind},
        registry::{EntryId, OwnershipEntry, OwnershipRegistry},
        window::{ReportWindow, iso},
    },
    ingestor::types::{Hotspot, Reward, RewardTransaction},
};
use chrono::{DateTime, Utc};
use std::mem;
use tracing::debug;

/// What happened to a single reward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// Added to an existing entry's gross earnings
    Credited(EntryId),
    /// No entry covered the reward; a default entry was registered seeded with it
    CreatedDefault(EntryId),
    /// Transaction time is outside the report window
    OutsideWindow,
    /// Amount or currency missing
    Skipped,
}

/// Attributes reward amounts to the ownership entry covering each reward
///
/// Owns the registry for the duration of one run. Rewards are attributed one
/// at a time, so for any hotspot the first matching entry always wins.
#[derive(Debug)]
pub struct RewardAccumulator {
    registry: OwnershipRegistry,
    window: ReportWindow,
    run_start: DateTime<Utc>,
    diagnostics: Vec<Diagnostic>,
}

impl RewardAccumulator {
    pub fn new(registry: OwnershipRegistry, window: ReportWindow, run_start: DateTime<Utc>) -> Self {
        Self {
            registry,
            window,
            run_start,
            diagnostics: vec![],
        }
    }

    pub fn window(&self) -> &ReportWindow {
        &self.window
    }

    pub fn registry(&self) -> &OwnershipRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OwnershipRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> OwnershipRegistry {
        self.registry
    }

    /// Anomalies raised since the last call
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    /// Attribute every reward of a transaction, in order
    pub fn attribute_transaction(
        &mut self,
        hotspot: &Hotspot,
        transaction: &RewardTransaction,
    ) -> Vec<Attribution> {
        transaction
            .rewards
            .iter()
            .map(|reward| self.attribute(hotspot, transaction.time, reward))
            .collect()
    }

    /// Attribute one reward, timed by its parent transaction
    pub fn attribute(
        &mut self,
        hotspot: &Hotspot,
        time: DateTime<Utc>,
        reward: &Reward,
    ) -> Attribution {
        let Some(amount) = reward.amount.as_ref() else {
            self.diagnose(
                DiagnosticKind::MissingAmount,
                hotspot,
                format!("{} reward at {} has no amount", reward.reward_type, iso(&time)),
            );
            return Attribution::Skipped;
        };
        if amount.currency.is_none() {
            self.diagnose(
                DiagnosticKind::MissingCurrency,
                hotspot,
                format!(
                    "{} reward of {} at {} has no currency",
                    reward.reward_type,
                    amount.value,
                    iso(&time)
                ),
            );
            return Attribution::Skipped;
        }

        if !self.window.contains(time) {
            return Attribution::OutsideWindow;
        }

        let matches = self.registry.find_matching_entries(&hotspot.address, time);
        let Some((&first, rest)) = matches.split_first() else {
            let configured = self.registry.entries_for(&hotspot.address).len();
            let mut entry = OwnershipEntry::default_for(hotspot, self.run_start);
            entry.gross_earnings = amount.value;
            let id = self.registry.add_entry(entry);
            self.diagnose(
                DiagnosticKind::DefaultEntryCreated,
                hotspot,
                format!(
                    "no host entry covers reward of {} at {} ({configured} configured); added a default entry",
                    amount.value,
                    iso(&time)
                ),
            );
            return Attribution::CreatedDefault(id);
        };

        if !rest.is_empty() {
            let hosts = matches
                .iter()
                .map(|id| self.registry.get(*id).host_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            self.diagnose(
                DiagnosticKind::MultipleMatches,
                hotspot,
                format!(
                    "{} host entries ({hosts}) cover reward of {} at {}; assigned to the first only",
                    matches.len(),
                    amount.value,
                    iso(&time)
                ),
            );
        }

        let entry = self.registry.get_mut(first);
        entry.gross_earnings += amount.value;
        debug!(
            "Added reward {} to {} ({}), gross earnings {}",
            amount.value, hotspot.name, entry.host_name, entry.gross_earnings
        );
        Attribution::Credited(first)
    }

    fn diagnose(&mut self, kind: DiagnosticKind, hotspot: &Hotspot, detail: String) {
        self.diagnostics
            .push(Diagnostic::new(kind, hotspot.name.clone(), detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calculator::registry::HostRecord,
        ingestor::types::RewardAmount,
    };
    use chrono::TimeZone;
    use rust_decimal::{Decimal, dec};

    const ADDRESS: &str = "112SZBhwV8Dp3QFgYYWN7hvz2xs5VjcimpVfzEZ1SWEnZFBEdnih";

    fn hotspot() -> Hotspot {
        Hotspot {
            address: ADDRESS.to_string(),
            name: "cheesy-bamboo-gorilla".to_string(),
            owner: None,
        }
    }

    fn reward(value: Decimal) -> Reward {
        Reward {
            reward_type: "poc_witnesses".to_string(),
            amount: Some(RewardAmount::native(value)),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, day, 12, 0, 0).unwrap()
    }

    fn accumulator(records: Vec<HostRecord>) -> RewardAccumulator {
        let run_start = Utc.with_ymd_and_hms(2021, 11, 13, 0, 0, 0).unwrap();
        let registry = OwnershipRegistry::from_records(records, run_start).unwrap();
        let window =
            ReportWindow::parse("2021-10-01T00:00:00.000Z", "2021-11-01T00:00:00.000Z").unwrap();
        RewardAccumulator::new(registry, window, run_start)
    }

    fn alice() -> HostRecord {
        HostRecord {
            name: "cheesy-bamboo-gorilla".to_string(),
            address: ADDRESS.to_string(),
            gross_share: dec!(0.78),
            net_share: dec!(0.25),
            host_name: "Alice".to_string(),
            host_wallet: None,
            from_datetime_iso: None,
            to_datetime_iso: None,
        }
    }

    #[test]
    fn test_small_rewards_sum_exactly() {
        let mut acc = accumulator(vec![alice()]);
        acc.attribute(&hotspot(), at(2), &reward(dec!(0.00000164)));
        acc.attribute(&hotspot(), at(3), &reward(dec!(0.00000836)));

        let entry = &acc.registry().entries()[0];
        assert_eq!(entry.gross_earnings, dec!(0.00001));
        assert!(acc.take_diagnostics().is_empty());
    }

    #[test]
    fn test_outside_window_never_accumulates() {
        let mut acc = accumulator(vec![alice()]);
        let before = Utc.with_ymd_and_hms(2021, 9, 30, 23, 59, 59).unwrap();
        let at_end = Utc.with_ymd_and_hms(2021, 11, 1, 0, 0, 0).unwrap();

        assert_eq!(
            acc.attribute(&hotspot(), before, &reward(dec!(5))),
            Attribution::OutsideWindow
        );
        assert_eq!(
            acc.attribute(&hotspot(), at_end, &reward(dec!(5))),
            Attribution::OutsideWindow
        );
        assert_eq!(acc.registry().entries()[0].gross_earnings, Decimal::ZERO);
        assert_eq!(acc.registry().len(), 1);
    }

    #[test]
    fn test_missing_amount_is_skipped() {
        let mut acc = accumulator(vec![alice()]);
        let no_amount = Reward {
            reward_type: "poc_challengers".to_string(),
            amount: None,
        };
        let no_currency = Reward {
            reward_type: "poc_challengers".to_string(),
            amount: Some(RewardAmount {
                value: dec!(1),
                currency: None,
            }),
        };

        assert_eq!(acc.attribute(&hotspot(), at(2), &no_amount), Attribution::Skipped);
        assert_eq!(acc.attribute(&hotspot(), at(2), &no_currency), Attribution::Skipped);
        assert_eq!(acc.registry().entries()[0].gross_earnings, Decimal::ZERO);

        let kinds = acc
            .take_diagnostics()
            .into_iter()
            .map(|d| d.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::MissingAmount, DiagnosticKind::MissingCurrency]
        );
    }

    #[test]
    fn test_unmatched_reward_creates_seeded_default() {
        let mut acc = accumulator(vec![]);
        let first = acc.attribute(&hotspot(), at(2), &reward(dec!(0.5)));
        let Attribution::CreatedDefault(id) = first else {
            panic!("expected a default entry, got {first:?}");
        };

        let entry = acc.registry().get(id);
        assert_eq!(entry.gross_earnings, dec!(0.5));
        assert_eq!(entry.gross_share, Decimal::ZERO);
        assert_eq!(entry.net_share, Decimal::ZERO);
        assert_eq!(entry.valid_from, DateTime::UNIX_EPOCH);

        // Later rewards land on the default entry instead of creating another
        assert_eq!(
            acc.attribute(&hotspot(), at(3), &reward(dec!(0.25))),
            Attribution::Credited(id)
        );
        assert_eq!(acc.registry().get(id).gross_earnings, dec!(0.75));
        assert_eq!(acc.registry().len(), 1);

        let diagnostics = acc.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DefaultEntryCreated);
    }

    #[test]
    fn test_reward_outside_configured_period_creates_default() {
        let mut ended = alice();
        ended.to_datetime_iso = Some("2021-10-10T00:00:00Z".to_string());
        let mut acc = accumulator(vec![ended]);

        assert_eq!(
            acc.attribute(&hotspot(), at(2), &reward(dec!(1))),
            Attribution::Credited(acc.registry().entries_for(ADDRESS)[0])
        );
        assert!(matches!(
            acc.attribute(&hotspot(), at(20), &reward(dec!(2))),
            Attribution::CreatedDefault(_)
        ));
        assert_eq!(acc.registry().entries()[0].gross_earnings, dec!(1));
        assert_eq!(acc.registry().entries()[1].gross_earnings, dec!(2));
    }

    #[test]
    fn test_first_match_wins() {
        let mut claire = alice();
        claire.host_name = "Claire".to_string();
        let mut acc = accumulator(vec![alice(), claire]);

        acc.attribute(&hotspot(), at(2), &reward(dec!(3)));

        let entries = acc.registry().entries();
        assert_eq!(entries[0].gross_earnings, dec!(3));
        assert_eq!(entries[1].gross_earnings, Decimal::ZERO);

        let diagnostics = acc.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MultipleMatches);
        assert!(diagnostics[0].detail.contains("Alice, Claire"));
    }

    #[test]
    fn test_attribution_is_order_independent() {
        let amounts = [dec!(0.1), dec!(0.2), dec!(0.00000001), dec!(7.12345678)];

        let mut forward = accumulator(vec![alice()]);
        for (day, amount) in amounts.iter().enumerate() {
            forward.attribute(&hotspot(), at(day as u32 + 1), &reward(*amount));
        }
        let mut backward = accumulator(vec![alice()]);
        for (day, amount) in amounts.iter().rev().enumerate() {
            backward.attribute(&hotspot(), at(day as u32 + 1), &reward(*amount));
        }

        let expected: Decimal = amounts.iter().sum();
        assert_eq!(forward.registry().entries()[0].gross_earnings, expected);
        assert_eq!(backward.registry().entries()[0].gross_earnings, expected);
    }

    #[test]
    fn test_attribute_transaction() {
        let mut acc = accumulator(vec![alice()]);
        let transaction = RewardTransaction {
            hash: "abc".to_string(),
            height: 1_000_000,
            time: at(5),
            rewards: vec![reward(dec!(1)), reward(dec!(2))],
        };

        let attributions = acc.attribute_transaction(&hotspot(), &transaction);
        assert_eq!(attributions.len(), 2);
        assert_eq!(acc.registry().entries()[0].gross_earnings, dec!(3));
    }
}
