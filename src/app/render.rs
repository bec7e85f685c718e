//! Ledger table rendering and the polling loop that drives it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::app::ledger_client::LedgerClient;
use crate::domain::EventRecord;
use crate::storage::ledger::DEFAULT_LIST_LIMIT;

pub const EMPTY_LEDGER: &str = "No transactions logged yet.";

/// One display row. Values are truncated copies; the record itself is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub kind: String,
    pub from: String,
    pub tx_hash: String,
    pub verified: &'static str,
    pub timestamp: String,
}

impl From<&EventRecord> for LedgerRow {
    fn from(record: &EventRecord) -> Self {
        Self {
            kind: record
                .kind
                .as_ref()
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
            from: record
                .user_address
                .as_deref()
                .map(short_address)
                .unwrap_or_else(|| "-".to_string()),
            tx_hash: record
                .transaction_hash
                .as_deref()
                .map(short_tx_hash)
                .unwrap_or_else(|| "-".to_string()),
            verified: record.verified_display(),
            timestamp: record
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }
}

/// `0x90F8...c9C1`. Values too short to shorten are returned as-is.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// `0x12ab34cd...`
pub fn short_tx_hash(hash: &str) -> String {
    if hash.chars().count() <= 10 {
        return hash.to_string();
    }
    let head: String = hash.chars().take(10).collect();
    format!("{}...", head)
}

/// Renders records as a fixed-width text table.
pub fn render_table(records: &[EventRecord]) -> String {
    if records.is_empty() {
        return EMPTY_LEDGER.to_string();
    }

    let header = ["Type", "From", "Tx Hash", "Verified", "Timestamp"];
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(LedgerRow::from)
        .map(|r| [r.kind, r.from, r.tx_hash, r.verified.to_string(), r.timestamp])
        .collect();

    let mut widths = header.map(|h| h.len());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 5]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(header));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        out.push(line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]));
    }
    out.join("\n")
}

/// Fetches and renders the ledger once immediately and then every `every`,
/// until `shutdown` is notified. Fetch failures are logged and the tick is skipped.
pub async fn run_render_loop<F>(
    client: LedgerClient,
    every: Duration,
    shutdown: Arc<Notify>,
    mut display: F,
) where
    F: FnMut(String) + Send,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match client.fetch_recent(DEFAULT_LIST_LIMIT as usize).await {
                    Ok(records) => display(render_table(&records)),
                    Err(e) => warn!(error = %e, "failed to load ledger"),
                }
            }
            _ = shutdown.notified() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, NewEvent};
    use chrono::Utc;

    fn record(kind: EventKind, verified: Option<bool>) -> EventRecord {
        let mut event = NewEvent::new(kind)
            .user_address("0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1")
            .transaction_hash("0x4b2a1d3e5f67890abcdef1234567890abcdef1234567890abcdef1234567890");
        event.verified = verified;
        event.into_record(1, Utc::now())
    }

    #[test]
    fn truncates_for_display_only() {
        let r = record(EventKind::Upload, Some(true));
        let row = LedgerRow::from(&r);
        assert_eq!(row.from, "0x90F8...c9C1");
        assert_eq!(row.tx_hash, "0x4b2a1d3e...");
        assert_eq!(row.verified, "Uploaded");
        assert_eq!(
            r.user_address.as_deref(),
            Some("0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1")
        );
    }

    #[test]
    fn short_values_are_kept() {
        assert_eq!(short_address("0xabc"), "0xabc");
        assert_eq!(short_tx_hash("0xdead"), "0xdead");
    }

    #[test]
    fn missing_fields_render_as_dash() {
        let r = NewEvent::default().into_record(3, Utc::now());
        let row = LedgerRow::from(&r);
        assert_eq!(row.kind, "-");
        assert_eq!(row.from, "-");
        assert_eq!(row.tx_hash, "-");
        assert_eq!(row.verified, "-");
    }

    #[test]
    fn table_lists_every_record() {
        let records = vec![
            record(EventKind::Verify, Some(false)),
            record(EventKind::VerifyFailed, Some(false)),
        ];
        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Type"));
        assert!(lines[2].contains("verify") && lines[2].contains("No"));
        assert!(lines[3].contains("Verify Failed"));
    }

    #[test]
    fn empty_ledger_message() {
        assert_eq!(render_table(&[]), EMPTY_LEDGER);
    }
}
