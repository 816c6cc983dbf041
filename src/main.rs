use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ifc_column_check::analysis::{length_unit_scale, FilterValue, StoreyFilter};
use ifc_column_check::config::{CheckConfig, ConfigFile};
use ifc_column_check::export::{export_csv, export_json, JsonLayout};
use ifc_column_check::geometry::SolidEvaluator;
use ifc_column_check::parser::load_model;
use ifc_column_check::report::{assemble, write_report_file};
use ifc_column_check::survey::{
    inventory, render_heights, render_inventory, survey_heights, BASE_TOLERANCE_M,
};

#[derive(Parser, Debug)]
#[command(name = "ifc-column-check")]
#[command(about = "Axial capacity control of IFC columns on selected storeys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every column on the selected storeys and write the report
    Check(CheckArgs),
    /// Survey column heights grouped by family and dimension label
    Heights(HeightsArgs),
    /// Count columns by family and dimension label
    Inventory {
        /// Path to IFC file
        file: PathBuf,
    },
}

/// Flags shared by commands that use the design parameters.
#[derive(Args, Debug)]
struct DesignArgs {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Design axial load Ned in kN
    #[arg(long, value_name = "KN")]
    load: Option<f64>,

    /// Material safety factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Default characteristic strength in N/mm²
    #[arg(long, value_name = "N/MM2")]
    fc_default: Option<f64>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to IFC file (overrides the config file)
    file: Option<PathBuf>,

    #[command(flatten)]
    design: DesignArgs,

    /// Storey filter mode: name_contains, name_equals, elevation_le,
    /// elevation_ge or elevation_between
    #[arg(long)]
    filter_mode: Option<String>,

    /// Storey filter value, e.g. "-1", "-0.5" or "-3,0"
    #[arg(long, allow_hyphen_values = true)]
    filter_value: Option<String>,

    /// Report output path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Export the checked columns to CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Export the report to JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Write the JSON export on a single line
    #[arg(long, requires = "json")]
    compact_json: bool,
}

#[derive(Args, Debug)]
struct HeightsArgs {
    /// Path to IFC file
    file: PathBuf,

    #[command(flatten)]
    design: DesignArgs,

    /// Only keep columns whose base lies at z = 0
    #[arg(long)]
    base_at_zero: bool,

    /// Tolerance in meters for --base-at-zero
    #[arg(long, default_value_t = BASE_TOLERANCE_M)]
    tolerance: f64,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Check(args) => run_check(args),
        Command::Heights(args) => run_heights(args),
        Command::Inventory { file } => {
            let model = load_model(&file)?;
            let mut stdout = io::stdout().lock();
            render_inventory(&inventory(&model), &mut stdout)?;
            Ok(())
        }
    }
}

/// Defaults, then the config file, then command-line flags.
fn design_config(design: &DesignArgs) -> Result<CheckConfig> {
    let mut config = CheckConfig::default();
    if let Some(path) = &design.config {
        config = config.merge_file(ConfigFile::load(path)?)?;
    }
    if let Some(load) = design.load {
        config.demand_load_kn = load;
    }
    if let Some(gamma) = design.gamma {
        config.gamma_m = gamma;
    }
    if let Some(strength) = design.fc_default {
        config.default_strength = strength;
    }
    Ok(config)
}

fn run_check(args: CheckArgs) -> Result<()> {
    let mut config = design_config(&args.design)?;
    if let Some(file) = args.file {
        config.model_path = file;
    }
    if let Some(output) = args.output {
        config.report_path = output;
    }
    if args.compact_json {
        config.json_layout = JsonLayout::Compact;
    }
    if args.filter_mode.is_some() || args.filter_value.is_some() {
        let mode = args
            .filter_mode
            .unwrap_or_else(|| config.storey_filter.mode().to_string());
        let value = args
            .filter_value
            .unwrap_or_else(|| config.storey_filter.to_string());
        config.storey_filter = StoreyFilter::from_mode(&mode, &FilterValue::Text(value))?;
    }

    let model = load_model(&config.model_path)?;
    let evaluator = SolidEvaluator::new(&model, length_unit_scale(&model));
    let report = assemble(&model, &config, &evaluator);

    write_report_file(&report, &config.report_path)?;
    println!("Report written to: {}", config.report_path.display());

    if let Some(csv_path) = &args.csv {
        export_csv(&report, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &args.json {
        export_json(&report, json_path, config.json_layout)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    Ok(())
}

fn run_heights(args: HeightsArgs) -> Result<()> {
    let config = design_config(&args.design)?;
    let model = load_model(&args.file)?;
    let evaluator = SolidEvaluator::new(&model, length_unit_scale(&model));

    let tolerance = args.base_at_zero.then_some(args.tolerance);
    let survey = survey_heights(&model, &evaluator, tolerance);

    let mut stdout = io::stdout().lock();
    render_heights(&survey, config.default_strength, config.gamma_m, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
