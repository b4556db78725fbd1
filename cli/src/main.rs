use clap::{Parser, Subcommand};
use schem_common::db::core::Circuit;
use schem_common::db::parser;
use schem_common::util::config::Config;
use schem_common::util::profiler::ScopedTimer;
use schem_common::util::visualization::{self, RouteSketch};
use schem_common::util::{generator, logger};
use schem_router::RoutedWire;
use schem_router::utils::check;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Circuit file; overrides `input.circuit_file` from the config.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route every dynamic wire, verify and render.
    Route {
        /// Also write the routes as TOML.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Route, then replace dynamic wires by static wire segments.
    Commit,
    /// Report the entity under a canvas position.
    Pick {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
    },
    Generate {
        #[arg(long, default_value_t = 8)]
        components: usize,
        #[arg(long, default_value_t = 6)]
        wires: usize,
        #[arg(long, default_value = "inputs/random.toml")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct RouteReport {
    wires: Vec<WireReport>,
}

#[derive(Serialize)]
struct WireReport {
    name: String,
    fallback: bool,
    waypoints: Vec<[i32; 2]>,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let input = args
        .input
        .unwrap_or_else(|| PathBuf::from(&config.input.circuit_file));

    match args.command.unwrap_or(Commands::Route { report: None }) {
        Commands::Generate {
            components,
            wires,
            output,
        } => {
            log::info!(
                "Generating random circuit ({} components, {} wires) on a {}x{} canvas...",
                components,
                wires,
                config.canvas.xsize,
                config.canvas.ysize
            );
            generator::generate_random_circuit(
                &output,
                config.canvas.xsize,
                config.canvas.ysize,
                components,
                wires,
            )?;
            log::info!("Generated: {:?}", output);
        }
        Commands::Route { report } => {
            let circuit = load_circuit(&input, &config)?;
            let wires = run_routing(&circuit, &config)?;
            print_routes(&circuit, &wires)?;
            if let Some(path) = report {
                write_report(&circuit, &wires, &path)?;
            }
        }
        Commands::Commit => {
            let mut circuit = load_circuit(&input, &config)?;
            let wires = run_routing(&circuit, &config)?;
            let count = wires.len();
            let created = schem_router::commit_all(&mut circuit, wires)
                .map_err(|e| anyhow::anyhow!(e))?;
            log::info!("Committed {} routed wires as {} static wires", count, created);

            let output = Path::new(&config.input.output_file);
            log::info!("Writing circuit to {:?}", output);
            parser::circuit::save(&circuit, output)
                .map_err(|e| anyhow::anyhow!("Failed to write '{}': {}", output.display(), e))?;
        }
        Commands::Pick { x, y } => {
            let circuit = load_circuit(&input, &config)?;
            let wires = run_routing(&circuit, &config)?;
            match schem_router::pick(&circuit, &wires, x, y) {
                Some(id) => {
                    let name = circuit.component(id).map_or("?", |c| c.name.as_str());
                    println!("{}", name);
                }
                None => println!("nothing at ({}, {})", x, y),
            }
        }
    }

    Ok(())
}

fn load_circuit(path: &Path, config: &Config) -> anyhow::Result<Circuit> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Circuit file missing: '{}'. Did you run 'generate'?",
            path.display()
        ));
    }
    log::info!("Parsing circuit: {}", path.display());
    parser::circuit::load(path, (config.canvas.xsize, config.canvas.ysize))
        .map_err(|e| anyhow::anyhow!("Invalid circuit file '{}': {}", path.display(), e))
}

fn run_routing(circuit: &Circuit, config: &Config) -> anyhow::Result<Vec<RoutedWire>> {
    let wires = {
        let _timer = ScopedTimer::new("Routing");
        schem_router::route_all(circuit, &config.routing).map_err(|e| anyhow::anyhow!(e))?
    };

    check::run(circuit, &wires).map_err(|e| anyhow::anyhow!("Verification Failed: {}", e))?;

    let sketches: Vec<RouteSketch> = wires
        .iter()
        .filter_map(|w| w.route().ok())
        .map(|r| RouteSketch {
            segments: r.segments(),
            is_fallback: r.is_fallback,
        })
        .collect();
    let image = Path::new(&config.input.image_file);
    log::info!("Generating routed visualization...");
    if let Err(e) = visualization::draw_routed_circuit(circuit, &sketches, image, 24) {
        log::warn!("Could not write {}: {}", image.display(), e);
    }

    Ok(wires)
}

fn wire_name(circuit: &Circuit, wire: &RoutedWire) -> String {
    circuit
        .component(wire.id())
        .map_or_else(|| wire.id().to_string(), |c| c.name.clone())
}

fn print_routes(circuit: &Circuit, wires: &[RoutedWire]) -> anyhow::Result<()> {
    for wire in wires {
        let route = wire.route().map_err(|e| anyhow::anyhow!(e))?;
        let path: Vec<String> = route.waypoints.iter().map(|c| c.to_string()).collect();
        println!(
            "{}{}: {}",
            wire_name(circuit, wire),
            if route.is_fallback { " (direct)" } else { "" },
            path.join(" -> ")
        );
    }
    Ok(())
}

fn write_report(circuit: &Circuit, wires: &[RoutedWire], path: &Path) -> anyhow::Result<()> {
    let wires = wires
        .iter()
        .map(|w| {
            let route = w.route().map_err(|e| anyhow::anyhow!(e))?;
            Ok(WireReport {
                name: wire_name(circuit, w),
                fallback: route.is_fallback,
                waypoints: route.waypoints.iter().map(|c| [c.x, c.y]).collect(),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let text = toml::to_string_pretty(&RouteReport { wires })?;
    std::fs::write(path, text)?;
    log::info!("Wrote route report to {}", path.display());
    Ok(())
}
