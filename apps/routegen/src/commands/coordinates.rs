use anyhow::{Context, Result};

use rg_core::RunRng;
use rg_output::ArtifactNames;
use rg_zones::{ZoneCoordinateSampler, load_od_csv, load_zones_json};

use crate::config::RunConfig;
use crate::layout;

pub fn run(config: &RunConfig) -> Result<()> {
    let od_path = config.od_file().context("od_data_path is not set")?;
    let records = load_od_csv(&od_path).with_context(|| format!("reading OD data {}", od_path.display()))?;
    let zone_path = config.zone_data_path.as_deref().context("zone_data_path is not set")?;
    let zones = load_zones_json(zone_path, &config.zone_crs)
        .with_context(|| format!("reading zones {}", zone_path.display()))?;
    log::info!("loaded {} OD records and {} zones", records.len(), zones.len());

    let selected = config.od_filter()?.resolve(&zones).apply(&records);
    let sampler = ZoneCoordinateSampler::new(config.max_sampling_attempts);
    let fix = config.destination_fix();
    let mut rng = RunRng::new(config.seed);
    let outcome = sampler.sample(&selected, &zones, fix.as_ref(), &mut rng);
    if !outcome.failures.is_empty() {
        log::warn!("{} of {} records could not be sampled", outcome.failures.len(), selected.len());
    }

    let dir = layout::coordinates_dir(layout::save_dir(config)?, &config.label()?);
    layout::emit(config, &dir, ArtifactNames::default(), |w| w.write_coordinates(&outcome.pairs))?;
    log::info!("{} coordinate pairs written to {}", outcome.pairs.len(), dir.display());
    Ok(())
}
