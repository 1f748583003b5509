use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use t3ms_compiler::{CompileError, Command, ExportSettings};

#[derive(Parser)]
#[command(name = "t3ms")]
#[command(about = "Compile OBJ meshes into T3MS vertex/command streams", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress progress output (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an OBJ mesh to T3MS
    Compile {
        /// Input OBJ file path
        input: PathBuf,

        /// Output T3MS file path
        #[arg(short, long)]
        output: PathBuf,

        /// Directory holding `<material name>.json` files
        #[arg(long)]
        materials: Option<PathBuf>,

        /// Multiplier applied to positions before conversion to 16-bit fixed point
        #[arg(long, default_value_t = ExportSettings::default().fixed_point_scale)]
        fixed_point_scale: f32,
    },
    /// Print a summary of a T3MS file
    Inspect {
        /// Input T3MS file path
        input: PathBuf,
    },
}

fn inspect(input: &Path) -> Result<(), CompileError> {
    let bytes = std::fs::read(input)?;
    let file = t3ms_compiler::decode_t3ms(&bytes)?;

    println!("{}: {} vertex pairs, {} commands", input.display(), file.vertex_pairs.len(), file.commands.len());
    for command in &file.commands {
        match command {
            Command::Vertices {
                offset,
                pair_count,
                source_index,
            } => println!("  VERTICES  offset={:<2} pairs={:<2} source={}", offset, pair_count, source_index),
            Command::Triangles { slots } => println!("  TRIANGLES count={}", slots.len()),
        }
    }

    let drawn: usize = file.replay()?.iter().map(Vec::len).sum();
    println!("{} triangles resolve against loaded slots", drawn);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging (suppressed if --quiet)
    if !cli.quiet {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            materials,
            fixed_point_scale,
        } => {
            let settings = ExportSettings { fixed_point_scale };
            t3ms_compiler::convert_obj(&input, &output, materials.as_deref(), &settings).map(|m| {
                if !cli.quiet {
                    eprintln!(
                        "Success: {} compiled ({} chunks, {} triangles -> {} batches, state cost {:.3})",
                        input.display(),
                        m.stats.chunk_count,
                        m.stats.triangle_count,
                        m.stats.batch_count,
                        m.stats.state_change_cost
                    );
                }
            })
        }
        Commands::Inspect { input } => inspect(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
