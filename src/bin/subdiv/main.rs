//! Subdiv CLI - inspect and evaluate subdivision control meshes.
//!
//! Usage: subdiv [OPTIONS] <COMMAND> <INPUT>
//!
//! Run `subdiv --help` for available commands.

use std::path::{Path, PathBuf};
use std::result::Result;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use subdiv_mesh::io;
use subdiv_mesh::prelude::*;

#[derive(Parser)]
#[command(name = "subdiv")]
#[command(author, version, about = "Subdivision control mesh CLI", long_about = None)]
struct Cli {
    /// Boundary sharpening rule
    #[arg(long, value_enum, global = true, default_value = "edge-only")]
    boundary: Boundary,

    /// Global tessellation rate
    #[arg(long, global = true, default_value = "2.0")]
    rate: f32,

    /// Use single-threaded execution (for benchmarking)
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the topology and display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Evaluate the surface at a parametric location
    Eval {
        /// Input mesh file
        input: PathBuf,

        /// Face index
        #[arg(short, long)]
        face: usize,

        /// Parametric u coordinate
        #[arg(short, long, default_value = "0.5")]
        u: f32,

        /// Parametric v coordinate
        #[arg(short, long, default_value = "0.5")]
        v: f32,

        /// Also print first and second derivatives
        #[arg(long)]
        derivatives: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Boundary {
    /// Sharp boundary edges, smooth corners
    EdgeOnly,
    /// Sharp boundary edges and corners
    EdgeAndCorner,
}

impl From<Boundary> for BoundaryMode {
    fn from(boundary: Boundary) -> Self {
        match boundary {
            Boundary::EdgeOnly => BoundaryMode::EdgeOnly,
            Boundary::EdgeAndCorner => BoundaryMode::EdgeAndCorner,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = TopologyOptions::default()
        .with_boundary(cli.boundary.into())
        .with_tessellation_rate(cli.rate)
        .with_parallel(!cli.sequential);

    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input, options)?;
        }

        Commands::Eval {
            input,
            face,
            u,
            v,
            derivatives,
        } => {
            let derivatives = if derivatives { Derivatives::Second } else { Derivatives::None };
            cmd_eval(&input, options, face, u, v, derivatives)?;
        }
    }

    Ok(())
}

fn load_mesh(input: &Path, options: TopologyOptions, flags: SceneFlags) -> Result<SubdivMesh, Box<dyn std::error::Error>> {
    let obj = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", obj.positions.len(), obj.num_faces());

    let mode = if options.parallel { "parallel" } else { "sequential" };
    let scene = Arc::new(Scene::new(flags));
    let mut mesh = obj.into_mesh(scene, options)?;

    let start = Instant::now();
    mesh.commit()?;
    println!("Built topology ({}, {:.2?})", mode, start.elapsed());
    Ok(mesh)
}

fn cmd_info(input: &Path, options: TopologyOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(input, options, SceneFlags::default())?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.half_edges().len());

    let boundary = mesh.half_edges().iter().filter(|e| !e.has_opposite()).count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary half-edges)", boundary);
    }

    let creased = mesh
        .half_edges()
        .iter()
        .filter(|e| e.has_opposite() && e.edge_crease_weight > 0.0)
        .count();
    println!("Creased half-edges: {}", creased);

    let invalid = (0..mesh.num_faces()).filter(|&f| mesh.is_invalid_face(f, 0)).count();
    if invalid > 0 {
        println!("Invalid faces: {}", invalid);
    }

    if mesh.verify() {
        println!("Verification: ok");
    } else {
        log::warn!("half-edge verification failed for {}", input.display());
        println!("Verification: FAILED");
    }

    let stats = mesh.patch_stats();
    println!("\nPatches:");
    println!("  Regular:   {:>8} ({:.1}%)", stats.regular, stats.percent(stats.regular));
    println!("  Irregular: {:>8} ({:.1}%)", stats.irregular, stats.percent(stats.irregular));
    println!("  Complex:   {:>8} ({:.1}%)", stats.complex, stats.percent(stats.complex));

    Ok(())
}

fn cmd_eval(
    input: &Path,
    options: TopologyOptions,
    face: usize,
    u: f32,
    v: f32,
    derivatives: Derivatives,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(input, options, SceneFlags::default().interpolatable())?;
    let result = mesh.interpolate(face, u, v, BufferType::Vertex(0), derivatives)?;

    println!("Face {} at ({}, {}):", face, u, v);
    print_value("P", &result, &result.p);
    if derivatives.first() {
        print_value("dP/du", &result, &result.dpdu);
        print_value("dP/dv", &result, &result.dpdv);
    }
    if derivatives.second() {
        print_value("d2P/du2", &result, &result.ddpdudu);
        print_value("d2P/dv2", &result, &result.ddpdvdv);
        print_value("d2P/dudv", &result, &result.ddpdudv);
    }

    Ok(())
}

fn print_value(name: &str, result: &Interpolation, values: &[f32]) {
    let components: Vec<String> = (0..result.num_floats)
        .map(|c| format!("{:.6}", values[c * result.count]))
        .collect();
    println!("  {:<9} ({})", name, components.join(", "));
}
