use anyhow::{bail, Context, Result};
use arithgen_netlist::{ComponentStats, GenerationContext};
use arithgen_ops::adder::{AdderObjective, AdderRequest, IntAdder};
use arithgen_ops::kcm::{FixRealKcm, FixRealKcmParams, IntIntKcm, IntIntKcmParams};
use arithgen_ops::multi_adder::{IntMultiAdder, MultiAdderStrategy};
use arithgen_target::Target;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;

mod config;

use config::BatchConfig;

/// Arithgen - FPGA arithmetic operator generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Target preset (virtex4, virtex5, virtex6, stratix4, generic)
    #[arg(short, long, default_value = "virtex5", global = true)]
    target: String,

    /// Clock frequency in MHz, overriding the preset
    #[arg(short, long, global = true)]
    frequency: Option<f64>,

    /// Generate without pipeline registers
    #[arg(long, global = true)]
    combinatorial: bool,

    /// Write the JSON report of every generated component here
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed-point by real constant multiplier (FixRealKCM)
    Kcm {
        /// Constant expression, e.g. "1/3" or "sqrt(2)"
        constant: String,

        /// Weight of the input LSB
        #[arg(long, allow_hyphen_values = true)]
        lsb_in: i32,

        /// Weight of the input MSB
        #[arg(long, allow_hyphen_values = true)]
        msb_in: i32,

        /// Weight of the output LSB
        #[arg(long, allow_hyphen_values = true)]
        lsb_out: i32,

        /// Two's complement input
        #[arg(long)]
        signed: bool,

        /// Accepted error in output ulps, within [0.5, 1]
        #[arg(long, default_value_t = 1.0)]
        error: f64,

        /// Sum partial products with an adder chain
        #[arg(long)]
        no_bit_heap: bool,

        /// Arrival time of the input (ns)
        #[arg(long, default_value_t = 0.0)]
        input_delay: f64,
    },

    /// Integer by integer constant multiplier (IntIntKCM)
    IntKcm {
        /// Input width
        width: usize,

        /// Non-negative decimal constant
        constant: String,

        /// Two's complement input
        #[arg(long)]
        signed: bool,

        /// Sum partial products with adders
        #[arg(long)]
        no_bit_heap: bool,
    },

    /// Pipelined two-operand adder
    Adder {
        /// Operand width
        width: usize,

        /// Resource to minimize
        #[arg(long, default_value = "slices")]
        objective: String,

        /// Arrival time of the operands (ns)
        #[arg(long, default_value_t = 0.0)]
        input_delay: f64,

        /// Disable shift-register carry storage
        #[arg(long)]
        no_srl: bool,
    },

    /// Multi-operand adder
    MultiAdder {
        /// Number of operands
        operands: usize,

        /// Operand width
        width: usize,

        /// Architecture, defaults to the target's preference
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Generate every operator listed in a TOML file
    Batch {
        /// Batch file
        file: PathBuf,
    },

    /// List the target presets
    Targets,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    NAdder,
    CompressorTree,
}

impl From<StrategyArg> for MultiAdderStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::NAdder => MultiAdderStrategy::NAdder,
            StrategyArg::CompressorTree => MultiAdderStrategy::CompressorTree,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let mut ctx = GenerationContext::new();
    let mut failures = 0;
    match &cli.command {
        Commands::Kcm {
            constant,
            lsb_in,
            msb_in,
            lsb_out,
            signed,
            error,
            no_bit_heap,
            input_delay,
        } => {
            let target = build_target(&cli)?;
            let params = FixRealKcmParams::new(*lsb_in, *msb_in, *signed, *lsb_out, constant)
                .with_target_ulp_error(*error)
                .with_bit_heap(!no_bit_heap)
                .with_input_delay(*input_delay);
            let kcm = FixRealKcm::new(&target, &mut ctx, &params)
                .with_context(|| format!("Failed to generate KCM for {constant}"))?;
            info!("Generated {}", kcm.name());
        }

        Commands::IntKcm {
            width,
            constant,
            signed,
            no_bit_heap,
        } => {
            let target = build_target(&cli)?;
            let params = IntIntKcmParams::new(*width, constant, *signed).with_bit_heap(!no_bit_heap);
            let kcm = IntIntKcm::new(&target, &mut ctx, &params)
                .with_context(|| format!("Failed to generate integer KCM for {constant}"))?;
            info!("Generated {}", kcm.name());
        }

        Commands::Adder {
            width,
            objective,
            input_delay,
            no_srl,
        } => {
            let target = build_target(&cli)?;
            let objective: AdderObjective = objective.parse()?;
            let mut request = AdderRequest::new(*width)
                .with_objective(objective)
                .with_input_delay("X", *input_delay)
                .with_input_delay("Y", *input_delay);
            if *no_srl {
                request = request.with_srl(false);
            }
            let adder = IntAdder::new(&target, &mut ctx, &request)
                .with_context(|| format!("Failed to generate {width}-bit adder"))?;
            info!(
                "Generated {} ({} chunks)",
                adder.name(),
                adder.choice().variant.chunks().len()
            );
        }

        Commands::MultiAdder {
            operands,
            width,
            strategy,
        } => {
            let target = build_target(&cli)?;
            let adder = IntMultiAdder::new(&target, &mut ctx, *operands, *width, strategy.map(Into::into))
                .with_context(|| format!("Failed to generate {operands}-operand adder"))?;
            info!("Generated {} with {}", adder.name(), adder.strategy());
        }

        Commands::Batch { file } => {
            let batch = BatchConfig::from_path(file)?;
            let mut target = batch.target.build()?;
            if let Some(f) = cli.frequency {
                target = target.with_frequency_mhz(f)?;
            }
            if cli.combinatorial {
                target = target.with_pipelining(false);
            }
            let report = config::run_batch(&batch, &target, &mut ctx);
            for (index, kind, error) in &report.failed {
                eprintln!("operator #{index} ({kind}) failed: {error}");
            }
            failures = report.failed.len();
            info!(
                "Generated {} of {} operators",
                report.generated.len(),
                batch.operators.len()
            );
        }

        Commands::Targets => {
            list_targets();
            return Ok(());
        }
    }

    write_report(&cli, &ctx)?;
    if failures > 0 {
        bail!("{failures} operator(s) failed");
    }
    Ok(())
}

fn build_target(cli: &Cli) -> Result<Target> {
    let mut target = Target::from_preset(&cli.target)?;
    if let Some(f) = cli.frequency {
        target = target.with_frequency_mhz(f)?;
    }
    if cli.combinatorial {
        target = target.with_pipelining(false);
    }
    Ok(target)
}

fn write_report(cli: &Cli, ctx: &GenerationContext) -> Result<()> {
    match &cli.output {
        Some(path) => {
            let json = ctx.to_json()?;
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => {
            for component in ctx.components() {
                println!("{}", ComponentStats::of(component));
            }
        }
    }
    Ok(())
}

fn list_targets() {
    for name in Target::PRESETS {
        if let Ok(t) = Target::from_preset(name) {
            println!(
                "{:<10} {:?}, {}-input LUTs, {} MHz",
                t.name, t.vendor, t.lut_inputs, t.frequency_mhz
            );
        }
    }
}
