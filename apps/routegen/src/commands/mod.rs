//! One module per mode.  Routing modes share [`route_pairs`].

pub mod congestion;
pub mod coordinates;
pub mod fixed_origins;
pub mod routes;

use anyhow::{Context, Result, bail};

use rg_batch::{BatchBuilder, BatchReport, ProgressLogger};
use rg_core::{CoordinatePair, RunRng};
use rg_output::{ArtifactNames, ArtifactWriter, CsvWriter, ErrorLogObserver, JsonWriter, read_routes};
use rg_routing::{OrsClient, OrsConfig, RateLimit, RoadSnapIndex};

use crate::config::RunConfig;
use crate::layout;

/// Keep a seeded random subset of at most `max` pairs, in `PairId` order.
pub fn cap_pairs(mut pairs: Vec<CoordinatePair>, max: Option<usize>, seed: u64) -> Vec<CoordinatePair> {
    let Some(max) = max else { return pairs };
    if pairs.len() <= max {
        return pairs;
    }
    let total = pairs.len();
    RunRng::new(seed).shuffle(&mut pairs);
    pairs.truncate(max);
    pairs.sort_by_key(|p| p.id);
    log::info!("routing {max} of {total} pairs");
    pairs
}

/// Route `pairs` against OpenRouteService.  The error log is streamed to
/// `{error_dir}/errors_{stamp}.csv` and written as JSON at the end.
pub fn route_pairs(config: &RunConfig, pairs: &[CoordinatePair], stamp: &str) -> Result<BatchReport> {
    let key = config.api_key().context("no ORS token in config or environment")?;
    let mut ors = OrsConfig::new(key);
    if let Some(url) = &config.ors_base_url {
        ors = ors.base_url(url.clone());
    }
    let client = OrsClient::new(ors).context("building ORS client")?;

    let mut builder = BatchBuilder::new(client)
        .profile(config.profile)
        .workers(config.workers)
        .rate_limit(RateLimit::per_minute(config.calls_per_minute));
    if let Some(path) = &config.snap_routes_path {
        let known = read_routes(path).with_context(|| format!("reading {}", path.display()))?;
        let index = RoadSnapIndex::from_polylines(
            known.iter().map(|r| r.points.as_slice()),
            config.snap_max_distance_m,
        );
        log::info!("local snapping over {} road vertices", index.len());
        builder = builder.local_snap(index);
    }
    let batch = builder.build()?;

    let error_dir = config.error_directory.as_deref().context("error_directory is not set")?;
    layout::prepare(error_dir)?;
    let names = ArtifactNames::default().errors(layout::error_stem(stamp));
    let mut observers = (
        ProgressLogger::new(100),
        ErrorLogObserver::new(CsvWriter::with_names(error_dir, names.clone())),
    );

    let report = batch.run(pairs, &mut observers)?;
    if !report.is_complete() {
        log::warn!("batch incomplete: {} of {} pairs dispatched", report.dispatched().len(), report.total());
    }

    if let Some(e) = observers.1.take_error() {
        log::error!("CSV error log incomplete: {e}");
    }
    let mut json = JsonWriter::with_names(error_dir, names);
    json.write_errors(&report.errors)?;
    json.finish()?;
    Ok(report)
}

/// Turn a batch stopped by a fatal failure into a non-zero exit, after the
/// partial output has been written.
pub fn check_fatal(report: &BatchReport) -> Result<()> {
    match &report.fatal {
        Some(fatal) => bail!(
            "batch stopped early ({} of {} pairs skipped): {fatal}",
            report.skipped,
            report.total()
        ),
        None => Ok(()),
    }
}
