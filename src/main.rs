use clap::{ArgAction, Parser, Subcommand};
use iiif_assemble::assemble::{self, RowFilter};
use iiif_assemble::catalog::CatalogReader;
use iiif_assemble::config::{self, Config, Overrides};
use iiif_assemble::{output, pipeline, rewrite};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iiif-assemble")]
#[command(about = "Build IIIF manifests and static deep-zoom tiles from a CSV catalog")]
#[command(long_about = "\
Build IIIF manifests and static deep-zoom tiles from a CSV catalog

Each catalog row names one scanned page. Contiguous rows with the same site
and title become the pages of one IIIF Presentation 2.0 manifest; each scan
is cut into IIIF Image API 2.0 level-0 tiles.

Catalog columns (no header by default):

  site, archive, locator, item type, filename, title

Source images are found at:

  <data>/<site>/<archive>/<locator>/<item type>/<filename>

Output layout:

  <output>/
  ├── manifests/
  │   ├── index.json               # Every manifest, upserted across runs
  │   └── <site-title>.json        # One per document
  └── images/tiles/
      └── <sha256 of scan>/        # Reused on every later build
          ├── info.json
          └── ...                  # Pre-cut JPEG tiles

Run 'iiif-assemble gen-config' to generate a documented iiif.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; missing file means stock defaults)
    #[arg(long, default_value = "iiif.toml", global = true)]
    config: PathBuf,

    /// Root directory of the scans
    #[arg(long, global = true)]
    data: Option<String>,

    /// Base URI baked into manifests and tile descriptors
    #[arg(long, global = true)]
    hostname: Option<String>,

    /// CSV catalog
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Output directory (receives manifests/ and images/tiles/)
    #[arg(long, global = true)]
    output: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tile every scan and write manifests and the index
    Build,
    /// Read the catalog and show the planned documents without tiling
    Check,
    /// Replace one base URL with another in an existing build
    Rewrite {
        /// Base URL currently baked into the output
        #[arg(long)]
        from: String,
        /// Base URL to publish under
        #[arg(long)]
        to: String,
    },
    /// Print a stock iiif.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            data: self.data.clone(),
            hostname: self.hostname.clone(),
            catalog: self.catalog.clone(),
            output_dir: self.output.clone(),
        }
    }

    fn load_config(&self) -> Result<Config, config::ConfigError> {
        config::load_config(&self.config, &self.overrides())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Build => {
            let config = cli.load_config()?;
            init_thread_pool(&config.processing);

            println!(
                "==> Building {} \u{2192} {}",
                config.catalog.path, config.output_dir
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline::run(&config, Some(tx));
            printer.join().ok();
            let summary = result?;
            println!();
            output::print_build_summary(&summary);
        }
        Command::Check => {
            let config = cli.load_config()?;
            println!("==> Checking {}", config.catalog.path);
            let rows = CatalogReader::open(&config.catalog_path(), config.catalog.has_headers)?;
            let plan = assemble::plan(rows, &RowFilter::from_config(&config))?;
            output::print_plan(&plan);
            println!("==> Catalog is valid");
        }
        Command::Rewrite { from, to } => {
            let config = cli.load_config()?;
            let report = rewrite::rewrite(&PathBuf::from(&config.output_dir), from, to)?;
            output::print_rewrite_report(&report, from, to);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the `tracing` subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "iiif_assemble=info",
        1 => "iiif_assemble=debug",
        _ => "iiif_assemble=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
