//! Caller-specified OD record selection.

use rg_core::{TimeOfDay, ZoneCode};

use crate::{OdRecord, ZoneSet};

/// Selects the OD records a run simulates.
///
/// Every criterion is optional; an empty filter keeps everything.  A time
/// criterion keeps records whose departure window contains it; records
/// without a window are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OdFilter {
    pub at: Option<TimeOfDay>,
    pub origin: Option<ZoneCode>,
    pub destination: Option<ZoneCode>,
}

impl OdFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, t: TimeOfDay) -> Self {
        self.at = Some(t);
        self
    }

    pub fn origin(mut self, zone: ZoneCode) -> Self {
        self.origin = Some(zone);
        self
    }

    pub fn destination(mut self, zone: ZoneCode) -> Self {
        self.destination = Some(zone);
        self
    }

    /// Rewrite zone criteria given as `api_code` aliases to the primary
    /// codes OD records use.  Unknown codes are left as they are.
    pub fn resolve(mut self, zones: &ZoneSet) -> Self {
        for zone in [&mut self.origin, &mut self.destination].into_iter().flatten() {
            if let Some(primary) = zones.primary_code(*zone).filter(|p| *p != *zone) {
                log::debug!("zone {zone} resolved to {primary}");
                *zone = primary;
            }
        }
        self
    }

    pub fn matches(&self, record: &OdRecord) -> bool {
        if let Some(t) = self.at {
            match record.window {
                Some(w) if w.contains(t) => {}
                _ => return false,
            }
        }
        if self.origin.is_some_and(|z| z != record.origin) {
            return false;
        }
        if self.destination.is_some_and(|z| z != record.destination) {
            return false;
        }
        true
    }

    /// Borrowing filter pass; order of `records` is preserved.
    pub fn apply<'a>(&self, records: &'a [OdRecord]) -> Vec<&'a OdRecord> {
        let kept: Vec<&OdRecord> = records.iter().filter(|r| self.matches(r)).collect();
        log::info!("OD filter kept {} of {} records", kept.len(), records.len());
        kept
    }
}
