use std::path::Path;

use anyhow::{Context, Result};

use rg_congestion::CongestionAggregator;
use rg_output::{ArtifactNames, read_routes};

use crate::config::RunConfig;
use crate::layout;

pub fn run(config: &RunConfig) -> Result<()> {
    let path = config.routes_path.as_deref().context("routes_path is not set")?;
    let routes = read_routes(path).with_context(|| format!("reading {}", path.display()))?;

    let aggregator = CongestionAggregator::new(config.tolerance)?;
    let results = aggregator
        .aggregate_routes(&routes)
        .with_context(|| format!("analysing {}", path.display()))?;

    for (rank, r) in results.iter().take(10).enumerate() {
        log::info!(
            "#{:<2} {} ({:.6},{:.6})-({:.6},{:.6}): {} crossings, {} trips",
            rank + 1,
            r.segment,
            r.a.lon,
            r.a.lat,
            r.b.lon,
            r.b.lat,
            r.crossing_count,
            r.trip_mass
        );
    }

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    layout::emit(config, dir, ArtifactNames::default(), |w| w.write_congestion(&results))?;
    log::info!("{} ranked segments written to {}", results.len(), dir.display());
    Ok(())
}
