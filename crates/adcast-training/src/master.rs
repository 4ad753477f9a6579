//! Join of ads, campaigns and per-ad event counts into one row per ad.

use std::collections::HashMap;

use adcast_core::EVENT_TYPES;
use adcast_model::Value;

use crate::error::TrainingError;
use crate::table::Table;

/// The joined training table. Same shape as a source [`Table`].
pub type MasterTable = Table;

/// The fixed vocabulary of the events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Comment,
    Impression,
    Like,
    Purchase,
    Share,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Click,
        EventType::Comment,
        EventType::Impression,
        EventType::Like,
        EventType::Purchase,
        EventType::Share,
    ];

    /// Case-insensitive parse of an `event_type` cell.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Outcome column name in the master table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        EVENT_TYPES[self.index()]
    }

    fn index(self) -> usize {
        match self {
            EventType::Click => 0,
            EventType::Comment => 1,
            EventType::Impression => 2,
            EventType::Like => 3,
            EventType::Purchase => 4,
            EventType::Share => 5,
        }
    }
}

/// Textual join key for a cell, so `7` and `7.0` compare equal.
fn key_of(value: &Value) -> Option<String> {
    value.category_label()
}

/// Build the master table.
///
/// Ads are left-joined to campaigns on `campaign_id`; event counts per ad are
/// pivoted into one column per [`EventType`] and left-joined on `ad_id`.
/// Columns: every ad column, then every campaign column except
/// `campaign_id`, then the six outcome columns. Ads without a campaign get
/// missing campaign values; ads without events get zero counts.
///
/// # Errors
///
/// Returns [`TrainingError`] if a join key column is missing, a key cell is
/// blank, an ad or campaign id repeats, or ad and campaign tables share a
/// non-key column name.
pub fn build_master_table(
    campaigns: &Table,
    ads: &Table,
    events: &Table,
) -> Result<MasterTable, TrainingError> {
    let campaign_key = campaigns.require_column("campaign_id")?;
    let ad_key = ads.require_column("ad_id")?;
    let ad_campaign_key = ads.require_column("campaign_id")?;
    let event_ad_key = events.require_column("ad_id")?;
    let event_type_col = events.require_column("event_type")?;

    let campaign_rows = index_unique(campaigns, campaign_key, "campaign_id")?;
    index_unique(ads, ad_key, "ad_id")?;

    let mut columns: Vec<String> = ads.columns().to_vec();
    let campaign_columns: Vec<usize> = (0..campaigns.columns().len())
        .filter(|&i| i != campaign_key)
        .collect();
    for &i in &campaign_columns {
        let name = &campaigns.columns()[i];
        if columns.contains(name) {
            return Err(TrainingError::DuplicateColumn {
                table: "master".to_string(),
                column: name.clone(),
            });
        }
        columns.push(name.clone());
    }
    for event in EventType::ALL {
        let name = event.as_str().to_string();
        if columns.contains(&name) {
            return Err(TrainingError::DuplicateColumn {
                table: "master".to_string(),
                column: name,
            });
        }
        columns.push(name);
    }

    let counts = count_events(events, event_ad_key, event_type_col);

    let mut unmatched_campaigns = 0usize;
    let mut rows = Vec::with_capacity(ads.len());
    for ad in ads.rows() {
        let mut row = ad.clone();

        let campaign = key_of(&ad[ad_campaign_key]).and_then(|k| campaign_rows.get(&k));
        match campaign {
            Some(&idx) => {
                let source = &campaigns.rows()[idx];
                row.extend(campaign_columns.iter().map(|&i| source[i].clone()));
            }
            None => {
                unmatched_campaigns += 1;
                row.extend(campaign_columns.iter().map(|_| Value::Missing));
            }
        }

        let ad_counts = key_of(&ad[ad_key])
            .and_then(|k| counts.get(&k).copied())
            .unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        row.extend(ad_counts.iter().map(|&c| Value::Number(c as f64)));

        rows.push(row);
    }

    if unmatched_campaigns > 0 {
        tracing::warn!(
            ads = unmatched_campaigns,
            "ads reference unknown campaigns; campaign fields left empty"
        );
    }

    let master = Table::new("master", columns, rows)?;
    tracing::info!(
        rows = master.len(),
        columns = master.columns().len(),
        "master table built"
    );
    Ok(master)
}

/// Map each key label to its row, rejecting blanks and repeats.
fn index_unique(
    table: &Table,
    key: usize,
    column: &str,
) -> Result<HashMap<String, usize>, TrainingError> {
    let mut index = HashMap::with_capacity(table.len());
    for (row, value) in table.column_values(key).enumerate() {
        let label = key_of(value).ok_or_else(|| TrainingError::MissingKey {
            table: table.name().to_string(),
            column: column.to_string(),
            row,
        })?;
        if index.insert(label.clone(), row).is_some() {
            return Err(TrainingError::DuplicateKey {
                table: table.name().to_string(),
                column: column.to_string(),
                key: label,
            });
        }
    }
    Ok(index)
}

fn count_events(events: &Table, ad_key: usize, type_col: usize) -> HashMap<String, [u64; 6]> {
    let mut counts: HashMap<String, [u64; 6]> = HashMap::new();
    let mut unknown_types = 0usize;
    let mut missing_ads = 0usize;

    for row in events.rows() {
        let Some(ad) = key_of(&row[ad_key]) else {
            missing_ads += 1;
            continue;
        };
        let event = row[type_col]
            .category_label()
            .and_then(|label| EventType::parse(&label));
        let Some(event) = event else {
            unknown_types += 1;
            continue;
        };
        counts.entry(ad).or_default()[event.index()] += 1;
    }

    if unknown_types > 0 {
        tracing::warn!(events = unknown_types, "events with unknown event_type skipped");
    }
    if missing_ads > 0 {
        tracing::warn!(events = missing_ads, "events without ad_id skipped");
    }

    counts
}
