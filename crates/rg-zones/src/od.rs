//! CSV loader for origin-destination records.
//!
//! # CSV format
//!
//! One row per OD flow.  Only the columns below are read; anything else in
//! the source file (gender, age, purposes, averages…) is ignored.
//!
//! ```csv
//! origin_hdong_cd,dest_hdong_cd,start_time,end_time,modal,od_cnts
//! 1101053,1101072,07:00,07:59,0.0,3.21
//! 1101054,1101072,08:00,08:59,3.0,1
//! ```
//!
//! | Column                    | Required | Meaning                              |
//! |---------------------------|----------|--------------------------------------|
//! | `origin_hdong_cd`         | yes      | origin zone code                     |
//! | `dest_hdong_cd`           | yes      | destination zone code                |
//! | `od_cnts`                 | yes      | trip count, rounded to an integer    |
//! | `start_time`, `end_time`  | no       | `HH:MM` departure window             |
//! | `modal`                   | no       | travel-mode code (see `TravelProfile::from_modal_code`) |
//!
//! The source data reports expanded counts with fractional parts; they are
//! rounded half away from zero.  Negative or non-finite counts are rejected.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rg_core::{RecordId, TimeOfDay, TimeWindow, TravelProfile, ZoneCode};

use crate::{ZoneError, ZoneResult};

// ── Public record ─────────────────────────────────────────────────────────────

/// One origin-destination flow.  Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OdRecord {
    pub id: RecordId,
    pub origin: ZoneCode,
    pub destination: ZoneCode,
    pub trip_count: u32,
    pub window: Option<TimeWindow>,
    pub modal: Option<u8>,
}

impl OdRecord {
    /// Profile derived from the source mode code, if it maps to one.
    pub fn profile(&self) -> Option<TravelProfile> {
        self.modal.and_then(TravelProfile::from_modal_code)
    }
}

// ── CSV row ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OdRow {
    origin_hdong_cd: u64,
    dest_hdong_cd:   u64,
    od_cnts:         f64,
    #[serde(default)]
    start_time:      Option<String>,
    #[serde(default)]
    end_time:        Option<String>,
    #[serde(default)]
    modal:           Option<f64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load OD records from a CSV file.
pub fn load_od_csv(path: &Path) -> ZoneResult<Vec<OdRecord>> {
    let file = std::fs::File::open(path)?;
    load_od_reader(file)
}

/// Like [`load_od_csv`] but accepts any `Read` source.
pub fn load_od_reader<R: Read>(reader: R) -> ZoneResult<Vec<OdRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (i, result) in csv_reader.deserialize::<OdRow>().enumerate() {
        let row = result.map_err(|e| ZoneError::Parse(e.to_string()))?;
        let id = RecordId::try_from(i)
            .map_err(|_| ZoneError::Parse(format!("row {i}: too many OD rows")))?;
        records.push(convert_row(id, row)?);
    }

    log::debug!("loaded {} OD records", records.len());
    Ok(records)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn convert_row(id: RecordId, row: OdRow) -> ZoneResult<OdRecord> {
    let trip_count = parse_count(row.od_cnts)
        .ok_or_else(|| ZoneError::Parse(format!("{id}: invalid od_cnts {}", row.od_cnts)))?;

    let window = match (row.start_time.as_deref(), row.end_time.as_deref()) {
        (Some(s), Some(e)) => Some(TimeWindow::new(s.parse::<TimeOfDay>()?, e.parse::<TimeOfDay>()?)),
        (None, None) => None,
        _ => {
            return Err(ZoneError::Parse(format!(
                "{id}: start_time and end_time must both be present or both be empty"
            )));
        }
    };

    let modal = match row.modal {
        None => None,
        Some(m) if m.fract() == 0.0 && (0.0..=255.0).contains(&m) => Some(m as u8),
        Some(m) => return Err(ZoneError::Parse(format!("{id}: invalid modal code {m}"))),
    };

    Ok(OdRecord {
        id,
        origin: ZoneCode(row.origin_hdong_cd),
        destination: ZoneCode(row.dest_hdong_cd),
        trip_count,
        window,
        modal,
    })
}

fn parse_count(raw: f64) -> Option<u32> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let rounded = raw.round();
    (rounded <= u32::MAX as f64).then_some(rounded as u32)
}
