//! In-zone coordinate sampling.
//!
//! Each retained OD record becomes one [`CoordinatePair`]: a uniform
//! interior point of the origin zone, and either a uniform interior point of
//! the destination zone or the fixed facility point.
//!
//! Interior points use bounded rejection sampling: draw uniformly inside the
//! zone's bounding box, keep the draw if the zone strictly contains it, and
//! give up after `max_attempts` draws.  Acceptance probability is the ratio
//! of zone area to bounding-box area.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use rg_core::{Coordinate, CoordinatePair, PairId, RecordId};

use crate::{OdRecord, SamplingError, ZonePolygon, ZoneSet};

/// Default rejection-sampling ceiling per point.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

// ── Destination fix ───────────────────────────────────────────────────────────

/// How the fixed destination is assigned across records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixAllocation {
    /// Independent coin flip per record with probability `p`.
    #[default]
    Bernoulli,
    /// Exactly `floor(n × p)` of the `n` records, chosen by a uniform
    /// random permutation.
    Quota,
}

/// A facility point that replaces sampled destinations with some probability.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DestinationFix {
    pub point: Coordinate,
    /// Clamped to `[0, 1]` when used.
    pub probability: f64,
    pub allocation: FixAllocation,
}

impl DestinationFix {
    pub fn new(point: Coordinate, probability: f64) -> Self {
        Self { point, probability, allocation: FixAllocation::Bernoulli }
    }

    pub fn allocation(mut self, allocation: FixAllocation) -> Self {
        self.allocation = allocation;
        self
    }

    fn p(&self) -> f64 {
        if self.probability.is_nan() { 0.0 } else { self.probability.clamp(0.0, 1.0) }
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// A record that produced no pair, and why.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingFailure {
    pub record: RecordId,
    pub error: SamplingError,
}

/// Result of one sampling pass.  `pairs` carry sequential `PairId`s in
/// record order.
#[derive(Clone, Debug, Default)]
pub struct SampleOutcome {
    pub pairs: Vec<CoordinatePair>,
    pub failures: Vec<SamplingFailure>,
}

// ── Sampler ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZoneCoordinateSampler {
    max_attempts: u32,
}

impl Default for ZoneCoordinateSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl ZoneCoordinateSampler {
    /// `max_attempts` is floored at 1.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one uniform interior point of `zone`.
    pub fn sample_point<R: Rng + ?Sized>(
        &self,
        zone: &ZonePolygon,
        rng: &mut R,
    ) -> Result<Coordinate, SamplingError> {
        let code = zone.code();
        let Some(bbox) = zone.bbox() else {
            return Err(SamplingError::EmptyZone(code));
        };
        let (min, max) = (bbox.min(), bbox.max());
        if !(max.x > min.x && max.y > min.y) || zone.area() <= 0.0 {
            return Err(SamplingError::EmptyZone(code));
        }

        for _ in 0..self.max_attempts {
            let candidate = Coordinate::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y));
            if zone.contains(candidate) {
                return Ok(candidate);
            }
        }
        Err(SamplingError::Exhausted { zone: code, attempts: self.max_attempts })
    }

    /// Turn filtered OD records into coordinate pairs.
    ///
    /// Records that cannot be sampled are reported in
    /// [`SampleOutcome::failures`] and skipped.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        records: &[&OdRecord],
        zones: &ZoneSet,
        fix: Option<&DestinationFix>,
        rng: &mut R,
    ) -> SampleOutcome {
        let fixed = fixed_mask(records.len(), fix, rng);
        let mut out = SampleOutcome::default();

        for (record, fixed_dest) in records.iter().zip(fixed) {
            match self.sample_record(record, zones, fix.filter(|_| fixed_dest), rng) {
                Ok((origin, destination)) => {
                    let id = PairId(out.pairs.len() as u32);
                    let mut pair = CoordinatePair::new(id, origin, destination, record.trip_count);
                    pair.profile = record.profile();
                    pair.origin_zone = Some(record.origin);
                    pair.destination_zone = Some(record.destination);
                    pair.destination_fixed = fixed_dest;
                    out.pairs.push(pair);
                }
                Err(error) => {
                    log::warn!("{}: sampling failed: {error}", record.id);
                    out.failures.push(SamplingFailure { record: record.id, error });
                }
            }
        }

        log::info!(
            "sampled {} coordinate pairs ({} fixed destinations, {} failures)",
            out.pairs.len(),
            out.pairs.iter().filter(|p| p.destination_fixed).count(),
            out.failures.len(),
        );
        out
    }

    fn sample_record<R: Rng + ?Sized>(
        &self,
        record: &OdRecord,
        zones: &ZoneSet,
        fix: Option<&DestinationFix>,
        rng: &mut R,
    ) -> Result<(Coordinate, Coordinate), SamplingError> {
        let origin_zone = zones.get(record.origin).ok_or(SamplingError::UnknownZone(record.origin))?;
        let origin = self.sample_point(origin_zone, rng)?;

        let destination = match fix {
            Some(f) => f.point,
            None => {
                let zone = zones
                    .get(record.destination)
                    .ok_or(SamplingError::UnknownZone(record.destination))?;
                self.sample_point(zone, rng)?
            }
        };
        Ok((origin, destination))
    }
}

/// Which records receive the fixed destination.
fn fixed_mask<R: Rng + ?Sized>(n: usize, fix: Option<&DestinationFix>, rng: &mut R) -> Vec<bool> {
    let Some(fix) = fix else {
        return vec![false; n];
    };
    let p = fix.p();
    match fix.allocation {
        FixAllocation::Bernoulli => (0..n).map(|_| rng.gen_bool(p)).collect(),
        FixAllocation::Quota => {
            let quota = (n as f64 * p).floor() as usize;
            let mut mask: Vec<bool> = (0..n).map(|i| i < quota).collect();
            mask.shuffle(rng);
            mask
        }
    }
}
