use std::path::PathBuf;

/// Route generation and segment congestion analysis
#[derive(clap::Parser, Debug)]
#[command(name = "routegen", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON run configuration
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// What to run
    #[arg(value_enum)]
    pub mode: Mode,
}

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Filter OD records and sample origin/destination coordinates
    Coordinates,
    /// Route a coordinates artifact
    Routes,
    /// Route fixed origins to one fixed destination
    FixedOrigins,
    /// Rank road segments of a routes artifact by overlap
    Congestion,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Coordinates => "coordinates",
            Mode::Routes => "routes",
            Mode::FixedOrigins => "fixed-origins",
            Mode::Congestion => "congestion",
        }
    }
}
