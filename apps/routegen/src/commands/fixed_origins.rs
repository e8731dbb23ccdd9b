use anyhow::{Context, Result};

use rg_output::ArtifactNames;
use rg_zones::pairs_from_fixed_origins;

use super::{check_fatal, route_pairs};
use crate::config::RunConfig;
use crate::layout;

pub fn run(config: &RunConfig) -> Result<()> {
    let destination = config.fixed_destination.context("fixed_destination is not set")?;
    let pairs = pairs_from_fixed_origins(&config.fixed_origins, destination, config.profile);

    let stamp = layout::timestamp();
    let report = route_pairs(config, &pairs, &stamp)?;

    let dir = layout::fixed_origins_dir(layout::save_dir(config)?);
    layout::emit(config, &dir, ArtifactNames::default().routes(stamp), |w| w.write_routes(&report.routes))?;
    log::info!("{} routes written to {}", report.routes.len(), dir.display());

    check_fatal(&report)
}
