use anyhow::{Context, Result};

use rg_output::{ArtifactNames, read_coordinates};

use super::{cap_pairs, check_fatal, route_pairs};
use crate::config::RunConfig;
use crate::layout;

pub fn run(config: &RunConfig) -> Result<()> {
    let path = config.coordinates_path.as_deref().context("coordinates_path is not set")?;
    let pairs = read_coordinates(path).with_context(|| format!("reading {}", path.display()))?;
    let pairs = cap_pairs(pairs, config.max_queries, config.seed);

    let stamp = layout::timestamp();
    let report = route_pairs(config, &pairs, &stamp)?;

    let dir = layout::routes_dir(layout::save_dir(config)?, &config.label()?);
    let names = ArtifactNames::default().routes(layout::routes_stem(report.routes.len()));
    layout::emit(config, &dir, names, |w| w.write_routes(&report.routes))?;
    log::info!("{} routes written to {}", report.routes.len(), dir.display());

    check_fatal(&report)
}
