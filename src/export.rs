use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::flatten::{DkEvent, EventGroup, OfferOutcome, render_opt};

/// Published column order of `results.csv`.
pub const COLUMNS: [&str; 21] = [
    "sportsbook",
    "displayGroupId",
    "sport",
    "eventGroupName",
    "eventGroupId",
    "nameIdentifier",
    "eventId",
    "providerOfferId",
    "startDate",
    "teamName1",
    "teamName2",
    "teamShortName1",
    "teamShortName2",
    "betType",
    "betName",
    "label",
    "line",
    "oddsAmerican",
    "timestamp",
    "isSuspended",
    "isOpen",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: Option<String>,
    pub display_group_id: Option<String>,
    pub event_group_id: Option<String>,
    pub event_group_name: Option<String>,
    pub name_identifier: Option<String>,
    pub start_date: Option<String>,
    pub team_name1: Option<String>,
    pub team_name2: Option<String>,
    pub team_short_name1: Option<String>,
    pub team_short_name2: Option<String>,
}

impl From<&DkEvent> for EventRecord {
    fn from(event: &DkEvent) -> Self {
        Self {
            event_id: render_opt(event.event_id.as_ref()),
            display_group_id: render_opt(event.display_group_id.as_ref()),
            event_group_id: render_opt(event.event_group_id.as_ref()),
            event_group_name: render_opt(event.event_group_name.as_ref()),
            name_identifier: render_opt(event.name_identifier.as_ref()),
            start_date: render_opt(event.start_date.as_ref()),
            team_name1: render_opt(event.team_name1.as_ref()),
            team_name2: render_opt(event.team_name2.as_ref()),
            team_short_name1: render_opt(event.team_short_name1.as_ref()),
            team_short_name2: render_opt(event.team_short_name2.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub timestamp: &'a str,
    pub sport: &'a str,
    pub sportsbook: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsRow {
    pub sportsbook: String,
    pub display_group_id: String,
    pub sport: String,
    pub event_group_name: String,
    pub event_group_id: String,
    pub name_identifier: String,
    pub event_id: String,
    pub provider_offer_id: String,
    pub start_date: String,
    pub team_name1: String,
    pub team_name2: String,
    pub team_short_name1: String,
    pub team_short_name2: String,
    pub bet_type: String,
    pub bet_name: String,
    pub label: String,
    pub line: String,
    pub odds_american: String,
    pub timestamp: String,
    pub is_suspended: String,
    pub is_open: String,
}

impl OddsRow {
    pub fn to_record(&self) -> [&str; 21] {
        [
            self.sportsbook.as_str(),
            self.display_group_id.as_str(),
            self.sport.as_str(),
            self.event_group_name.as_str(),
            self.event_group_id.as_str(),
            self.name_identifier.as_str(),
            self.event_id.as_str(),
            self.provider_offer_id.as_str(),
            self.start_date.as_str(),
            self.team_name1.as_str(),
            self.team_name2.as_str(),
            self.team_short_name1.as_str(),
            self.team_short_name2.as_str(),
            self.bet_type.as_str(),
            self.bet_name.as_str(),
            self.label.as_str(),
            self.line.as_str(),
            self.odds_american.as_str(),
            self.timestamp.as_str(),
            self.is_suspended.as_str(),
            self.is_open.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct JoinedRows {
    pub rows: Vec<OddsRow>,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub rows_written: usize,
    pub rows_dropped: usize,
}

pub fn event_records(group: &EventGroup) -> Vec<EventRecord> {
    group.events.iter().map(EventRecord::from).collect()
}

pub fn join_events(
    offer_outcomes: Vec<OfferOutcome>,
    events: &[EventRecord],
    ctx: &RowContext<'_>,
) -> JoinedRows {
    let mut by_id: HashMap<&str, &EventRecord> = HashMap::with_capacity(events.len());
    for event in events {
        if let Some(id) = event.event_id.as_deref() {
            by_id.entry(id).or_insert(event);
        }
    }

    let mut joined = JoinedRows {
        rows: Vec::with_capacity(offer_outcomes.len()),
        dropped: 0,
    };
    for item in offer_outcomes {
        let event = item
            .event_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied());
        match complete_row(item, event, ctx) {
            Some(row) => joined.rows.push(row),
            None => joined.dropped += 1,
        }
    }

    // Stable, so rows of one game keep their market order.
    joined
        .rows
        .sort_by(|a, b| a.name_identifier.cmp(&b.name_identifier));

    debug!(
        kept = joined.rows.len(),
        dropped = joined.dropped,
        "joined offers to events"
    );
    joined
}

fn complete_row(
    item: OfferOutcome,
    event: Option<&EventRecord>,
    ctx: &RowContext<'_>,
) -> Option<OddsRow> {
    let event = event?;
    let label = item.label?;
    let line = item.line?;
    let bet_name = format!("{label} {line}");

    Some(OddsRow {
        sportsbook: ctx.sportsbook.to_string(),
        display_group_id: event.display_group_id.clone()?,
        sport: ctx.sport.to_string(),
        event_group_name: event.event_group_name.clone()?,
        event_group_id: event.event_group_id.clone()?,
        name_identifier: event.name_identifier.clone()?,
        event_id: item.event_id?,
        provider_offer_id: item.provider_offer_id?,
        start_date: event.start_date.clone()?,
        team_name1: event.team_name1.clone()?,
        team_name2: event.team_name2.clone()?,
        team_short_name1: event.team_short_name1.clone()?,
        team_short_name2: event.team_short_name2.clone()?,
        bet_type: item.bet_type?,
        bet_name,
        label,
        line,
        odds_american: item.odds_american?,
        timestamp: ctx.timestamp.to_string(),
        is_suspended: item.is_suspended?,
        is_open: item.is_open?,
    })
}

/// Replaces `path` only once the whole file is on disk.
pub fn write_csv(path: &Path, rows: &[OddsRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");

    let written = write_csv_file(&tmp, rows).and_then(|()| {
        fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))
    });
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    info!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}

fn write_csv_file(tmp: &Path, rows: &[OddsRow]) -> Result<()> {
    let file = File::create(tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    write_record(&mut w, &COLUMNS).context("write csv header")?;
    for row in rows {
        write_record(&mut w, &row.to_record()).context("write csv row")?;
    }
    w.flush().context("flush csv")?;
    Ok(())
}

pub fn write_record<W: Write>(mut w: W, fields: &[&str]) -> std::io::Result<()> {
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

pub fn export_rows(path: &Path, joined: JoinedRows) -> Result<ExportReport> {
    write_csv(path, &joined.rows)?;
    Ok(ExportReport {
        path: path.to_path_buf(),
        rows_written: joined.rows.len(),
        rows_dropped: joined.dropped,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{EventRecord, RowContext, join_events, write_csv, write_record};
    use crate::flatten::OfferOutcome;

    fn event(id: &str, name: &str) -> EventRecord {
        EventRecord {
            event_id: Some(id.to_string()),
            display_group_id: Some("2".to_string()),
            event_group_id: Some("84240".to_string()),
            event_group_name: Some("MLB".to_string()),
            name_identifier: Some(name.to_string()),
            start_date: Some("2023-06-01T23:05:00.0000000Z".to_string()),
            team_name1: Some("NY Yankees".to_string()),
            team_name2: Some("BOS Red Sox".to_string()),
            team_short_name1: Some("NYY".to_string()),
            team_short_name2: Some("BOS".to_string()),
        }
    }

    fn outcome(event_id: &str, offer_id: &str, label: &str, line: &str) -> OfferOutcome {
        OfferOutcome {
            label: Some(label.to_string()),
            line: Some(line.to_string()),
            odds_american: Some("-110".to_string()),
            provider_offer_id: Some(offer_id.to_string()),
            bet_type: Some("Total".to_string()),
            is_suspended: Some("False".to_string()),
            is_open: Some("True".to_string()),
            event_id: Some(event_id.to_string()),
        }
    }

    const CTX: RowContext<'static> = RowContext {
        timestamp: "Thu, 01 Jun 2023 17:04:09 GMT",
        sport: "Baseball",
        sportsbook: "DraftKings",
    };

    #[test]
    fn drops_rows_without_event_or_with_gaps() {
        let mut gap = outcome("1", "o2", "Under", "+8.5");
        gap.odds_american = None;
        let items = vec![
            outcome("1", "o1", "Over", "+8.5"),
            outcome("999", "o9", "Over", "+8.5"),
            gap,
        ];
        let joined = join_events(items, &[event("1", "NYY @ BOS")], &CTX);
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.dropped, 2);
        assert_eq!(joined.rows[0].bet_name, "Over +8.5");
        assert_eq!(joined.rows[0].sportsbook, "DraftKings");
        assert_eq!(joined.rows[0].timestamp, CTX.timestamp);
    }

    #[test]
    fn sort_by_game_is_stable() {
        let items = vec![
            outcome("2", "b1", "Over", "+7.5"),
            outcome("1", "a1", "Over", "+9.5"),
            outcome("2", "b1", "Under", "+7.5"),
            outcome("1", "a1", "Under", "+9.5"),
        ];
        let events = [event("1", "ATL @ MIA"), event("2", "CHC @ STL")];
        let joined = join_events(items, &events, &CTX);
        let order: Vec<&str> = joined.rows.iter().map(|r| r.bet_name.as_str()).collect();
        assert_eq!(order, vec!["Over +9.5", "Under +9.5", "Over +7.5", "Under +7.5"]);
    }

    #[test]
    fn quotes_fields_with_separators() {
        let mut out = Vec::new();
        write_record(&mut out, &["a", "b,c", "say \"hi\""]).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "a,\"b,c\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("dk_odds_{}_blocked", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let target = dir.join("results.csv");
        // A directory where the csv should land makes the final rename fail.
        fs::create_dir_all(&target).expect("seed dir");

        let joined = join_events(vec![outcome("1", "o1", "Over", "+8.5")], &[event("1", "G")], &CTX);
        assert!(write_csv(&target, &joined.rows).is_err());
        assert!(!target.with_extension("csv.tmp").exists());
        assert!(target.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }
}
