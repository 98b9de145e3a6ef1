/// Starfolio Terminal - the scroll-driven starfield in a terminal
///
/// Controls:
///   - Mouse wheel / J,K / Arrow keys: Scroll the virtual page
///   - PageUp/PageDown/Space: Scroll faster, G/Home: back to top
///   - C: Copy the configured email address
///   - Q/ESC: Quit
///
/// Logs go to stderr; redirect it (`2>starfolio.log`) when raising `RUST_LOG`.
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use starfolio_core::{AppState, StarfolioConfig};
use starfolio_terminal::TerminalApp;

#[derive(Debug, Parser)]
#[command(name = "starfolio-terminal", version, about = "Scroll-driven starfield in the terminal")]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding space.jpg, duncan.png, earth.png and normal.jpg
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Seed for star placement, for reproducible layouts
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StarfolioConfig::load_from_path(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
        None => StarfolioConfig::default(),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (width, height) = crossterm::terminal::size()?;
    let state = AppState::new(&config, width as u32, height as u32, &mut rng);

    let mut app = TerminalApp::new(&config, state, &args.assets)?;
    app.run()?;

    println!("Thanks for scrolling through Starfolio!");
    Ok(())
}
