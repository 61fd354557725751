#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::path::PathBuf;

    use backdrop::{BackdropConfig, Palette};
    use clap::Parser;

    /// Preview the animated node backdrop in a desktop window.
    #[derive(Parser, Debug)]
    #[command(name = "backdrop", version)]
    struct Cli {
        /// JSON file with backdrop settings (same keys as data-backdrop-config).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use the dark-page palette (white) instead of gold.
        #[arg(long)]
        dark: bool,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    }

    let cli = Cli::parse();
    let backdrop_config = match cli.config {
        Some(path) => BackdropConfig::from_path(&path)?,
        None => BackdropConfig::default(),
    };

    backdrop::run(
        backdrop_config,
        Palette::from_dark_flag(cli.dark),
        winit::dpi::LogicalSize::new(cli.width, cli.height),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {}
