#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use helium_host_payments::{
    ingestor::types::{Hotspot, Reward, RewardAmount, RewardTransaction, TransactionPage},
    settings,
};
use rust_decimal::{Decimal, dec};
use std::{fs, path::Path};

pub const OWNER_WALLET: &str = "13shErS29gws7ikVxkb4s13PZ6sQLSY63xRKP8DEBww2qWFhUu5";
pub const HOST_WALLET: &str = "14hMXiRfQ4oKqCnE3ZSv9rMyhJM3DGGcQ4iVxzJcXzT3y5CfNcR";

/// Create test settings for the October 2021 window
pub fn create_test_settings(output_dir: &Path, hosts_file: Option<&Path>) -> settings::Settings {
    settings::Settings {
        log_level: "info".to_string(),
        explorer: settings::ExplorerSettings {
            api_url: "https://api.helium.io/v1".to_string(),
            web_url: "https://explorer.helium.com".to_string(),
            timeout_secs: 30,
        },
        report: settings::ReportSettings {
            wallet_address: OWNER_WALLET.to_string(),
            start: "2021-10-01T00:00:00.000Z".to_string(),
            end: "2021-11-01T00:00:00.000Z".to_string(),
            memo: "20211101".to_string(),
            payment_minimum: dec!(0.4),
            hosts_file: hosts_file.map(Path::to_path_buf),
        },
        limits: settings::LimitSettings {
            max_hotspots: 30,
            max_transaction_pages: 300,
            page_size: 50,
            lowest_block: 468_000,
        },
        output: settings::OutputSettings {
            dir: output_dir.to_path_buf(),
        },
        oracle: settings::OracleSettings::default(),
    }
}

pub fn run_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 11, 13, 9, 30, 0).unwrap()
}

pub fn hotspot(name: &str, address: &str) -> Hotspot {
    Hotspot {
        address: address.to_string(),
        name: name.to_string(),
        owner: Some(OWNER_WALLET.to_string()),
    }
}

pub fn witness_reward(amount: Decimal) -> Reward {
    Reward {
        reward_type: "poc_witnesses".to_string(),
        amount: Some(RewardAmount::native(amount)),
    }
}

/// A rewards transaction at `(month, day)` of 2021, noon UTC
pub fn transaction(hash: &str, height: u64, (month, day): (u32, u32), rewards: Vec<Reward>) -> RewardTransaction {
    RewardTransaction {
        hash: hash.to_string(),
        height,
        time: Utc.with_ymd_and_hms(2021, month, day, 12, 0, 0).unwrap(),
        rewards,
    }
}

pub fn page(transactions: Vec<RewardTransaction>, cursor: Option<&str>) -> TransactionPage {
    TransactionPage {
        transactions,
        cursor: cursor.map(str::to_string),
    }
}

/// Write an ownership configuration file and return its path
pub fn write_hosts_file(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("hosts.json");
    fs::write(&path, json).unwrap();
    path
}

/// Names of the files in `dir`, sorted
pub fn artifact_names(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}

/// Contents of the single file in `dir` whose name starts with `prefix`
pub fn read_artifact(dir: &Path, prefix: &str) -> String {
    let matches = artifact_names(dir)
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect::<Vec<_>>();
    assert_eq!(matches.len(), 1, "expected one {prefix} artifact, found {matches:?}");
    fs::read_to_string(dir.join(&matches[0])).unwrap()
}
