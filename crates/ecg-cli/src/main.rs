use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ecg_lib::{
    detectors::ecg::detect_r_peaks,
    inputs::{BloodPressure, PhysiologicalInputs, StressLevel},
    io::{
        csv as csv_io,
        reports::{self, DirectoryReportStore, GenerationSummary, ReportRecord, ReportStore},
        text as text_io,
    },
    leads::{resolve_lead, LEADS},
    metrics::report::{aggregate, aggregate_series},
    plot::{figure_from_samples, Figure, PlotBackend, Series},
    signal::{sample_columns, Sample, TimeSeries, SAMPLE_RATE_HZ},
    synth::{synthesize, try_synthesize_with_rng},
};
use log::{info, warn};
use plotters::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ecg",
    version,
    about = "Synthetic ECG generation and beat/interval analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported leads
    Leads,
    /// Synthesize a trace, analyse it and print everything as JSON
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Analyse an exported CSV table or a newline-delimited amplitude file
    Metrics {
        /// Table written by `ecg export`
        #[arg(long, conflicts_with = "series")]
        csv: Option<PathBuf>,
        /// One amplitude (mV) per line
        #[arg(long)]
        series: Option<PathBuf>,
        #[arg(long, default_value_t = SAMPLE_RATE_HZ)]
        fs: f64,
    },
    /// Synthesize a trace and write it as a CSV table
    Export {
        #[command(flatten)]
        args: GenerateArgs,
        #[arg(long, default_value = "exports")]
        out_dir: PathBuf,
        /// File name prefix
        #[arg(long, default_value = "ecg_export")]
        name: String,
    },
    /// List stored report records, newest id first
    Reports {
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,
    },
    /// Show one report record grouped by topic
    ReportDetails {
        filename: String,
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,
    },
    /// Render a trace with its detected R-peaks to a PNG via plotters
    Plot {
        #[command(flatten)]
        args: GenerateArgs,
        /// Plot an exported table instead of synthesizing
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 4000)]
        max_points: usize,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Report record (file name inside --reports-dir)
    #[arg(long, conflicts_with = "inputs")]
    report: Option<String>,
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,
    /// Parameter file (.json or .toml)
    #[arg(long)]
    inputs: Option<PathBuf>,
    #[arg(long, default_value = "Lead II")]
    lead: String,
    /// Seconds; fractions are truncated
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
    /// Seed the generator for a reproducible trace
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    overrides: InputOverrides,
}

#[derive(Args)]
struct InputOverrides {
    #[arg(long)]
    heart_rate: Option<f64>,
    #[arg(long)]
    hrv_sdnn: Option<f64>,
    #[arg(long)]
    mean_rri: Option<f64>,
    #[arg(long)]
    rmssd: Option<f64>,
    /// 0 None, 1 Low, 2 Normal, 3 High
    #[arg(long)]
    stress_level: Option<u8>,
    #[arg(long)]
    breathing_rate: Option<f64>,
    #[arg(long)]
    oxygen_saturation: Option<f64>,
    /// "systolic/diastolic"
    #[arg(long)]
    blood_pressure: Option<String>,
    #[arg(long)]
    pns_index: Option<f64>,
    #[arg(long)]
    sns_index: Option<f64>,
    #[arg(long)]
    lf_hf: Option<f64>,
}

impl InputOverrides {
    fn apply(&self, mut inputs: PhysiologicalInputs) -> PhysiologicalInputs {
        let numeric = [
            (self.heart_rate, &mut inputs.heart_rate),
            (self.hrv_sdnn, &mut inputs.hrv_sdnn),
            (self.mean_rri, &mut inputs.mean_rri),
            (self.rmssd, &mut inputs.rmssd),
            (self.breathing_rate, &mut inputs.breathing_rate),
            (self.oxygen_saturation, &mut inputs.oxygen_saturation),
            (self.pns_index, &mut inputs.pns_index),
            (self.sns_index, &mut inputs.sns_index),
            (self.lf_hf, &mut inputs.lf_hf),
        ];
        for (value, field) in numeric {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(code) = self.stress_level {
            inputs.stress_level = StressLevel::from_code(code as f64);
        }
        if let Some(bp) = &self.blood_pressure {
            inputs.blood_pressure = BloodPressure::parse_or_default(bp);
        }
        inputs.validated()
    }
}

/// Inputs plus the report fields echoed back with a generated trace.
struct Generation {
    inputs: PhysiologicalInputs,
    summary: GenerationSummary,
    samples: Vec<Sample>,
    lead: String,
    duration_s: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Leads => cmd_leads()?,
        Commands::Generate { args } => cmd_generate(&args)?,
        Commands::Metrics { csv, series, fs } => {
            cmd_metrics(csv.as_deref(), series.as_deref(), fs)?
        }
        Commands::Export { args, out_dir, name } => cmd_export(&args, &out_dir, &name)?,
        Commands::Reports { reports_dir } => cmd_reports(&reports_dir)?,
        Commands::ReportDetails {
            filename,
            reports_dir,
        } => cmd_report_details(&filename, &reports_dir)?,
        Commands::Plot {
            args,
            csv,
            out,
            max_points,
        } => cmd_plot(&args, csv.as_deref(), &out, max_points)?,
    }
    Ok(())
}

fn whole_seconds(duration: f64) -> u32 {
    if duration.fract() != 0.0 {
        warn!("duration {duration} s truncated to whole seconds");
    }
    duration.max(0.0) as u32
}

fn load_source(args: &GenerateArgs) -> Result<(PhysiologicalInputs, GenerationSummary)> {
    let record = match (&args.report, &args.inputs) {
        (Some(name), _) => DirectoryReportStore::new(&args.reports_dir).load(name)?,
        (None, Some(path)) => inputs_record(path, reports::read_inputs(path)?)?,
        (None, None) => inputs_record(Path::new("defaults"), PhysiologicalInputs::default())?,
    };
    let inputs = args.overrides.apply(record.inputs()?);
    Ok((inputs, record.generation_summary()?))
}

fn inputs_record(origin: &Path, inputs: PhysiologicalInputs) -> Result<ReportRecord> {
    let text = serde_json::to_string(&inputs)?;
    ReportRecord::from_json(origin.display().to_string(), text.len() as u64, &text)
}

fn generate(args: &GenerateArgs) -> Result<Generation> {
    let (inputs, summary) = load_source(args)?;
    let duration_s = whole_seconds(args.duration);
    let samples = match args.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            try_synthesize_with_rng(&inputs, &args.lead, duration_s, &mut rng)
                .context("failed to generate ECG")?
        }
        None => synthesize(&inputs, &args.lead, duration_s),
    };
    if samples.is_empty() {
        anyhow::bail!("failed to generate ECG");
    }
    info!(
        "generated {} samples of {} ({duration_s} s)",
        samples.len(),
        resolve_lead(&args.lead).name
    );
    Ok(Generation {
        inputs,
        summary,
        samples,
        lead: args.lead.clone(),
        duration_s,
    })
}

fn cmd_leads() -> Result<()> {
    let js = serde_json::to_string(&json!({ "leads": LEADS }))?;
    println!("{}", js);
    Ok(())
}

fn cmd_generate(args: &GenerateArgs) -> Result<()> {
    let generation = generate(args)?;
    let metrics = aggregate(&generation.samples)?;
    let lead = resolve_lead(&generation.lead);
    let description = if lead.name == generation.lead {
        lead.description
    } else {
        ""
    };
    let js = serde_json::to_string(&json!({
        "success": true,
        "ecg_data": generation.samples,
        "metrics": metrics,
        "inputs": generation.inputs,
        "report_summary": generation.summary,
        "lead_info": {
            "name": generation.lead,
            "description": description,
            "sample_rate": SAMPLE_RATE_HZ,
            "duration": generation.duration_s,
        },
    }))?;
    println!("{}", js);
    Ok(())
}

fn cmd_metrics(csv: Option<&Path>, series: Option<&Path>, fs: f64) -> Result<()> {
    let metrics = match (csv, series) {
        (Some(path), _) => aggregate(&csv_io::read_samples_csv(path)?)?,
        (None, Some(path)) => {
            let data = text_io::read_f64_series(path)?;
            aggregate_series(&TimeSeries { fs, data })?
        }
        (None, None) => anyhow::bail!("pass --csv or --series"),
    };
    println!("{}", serde_json::to_string(&metrics)?);
    Ok(())
}

fn cmd_export(args: &GenerateArgs, out_dir: &Path, name: &str) -> Result<()> {
    let generation = generate(args)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let stamp = chrono::Local::now()
        .format(csv_io::EXPORT_TIMESTAMP_FORMAT)
        .to_string();
    let filename = csv_io::export_file_name(name, &generation.lead.replace(' ', "_"), &stamp);
    let path = out_dir.join(&filename);
    let rows = csv_io::write_samples_csv(&path, &generation.samples)?;
    let js = serde_json::to_string(&json!({
        "success": true,
        "filename": filename,
        "path": path.display().to_string(),
        "rows": rows,
    }))?;
    println!("{}", js);
    Ok(())
}

fn cmd_reports(reports_dir: &Path) -> Result<()> {
    let reports = DirectoryReportStore::new(reports_dir).list()?;
    let js = serde_json::to_string(&json!({
        "success": true,
        "count": reports.len(),
        "reports": reports,
    }))?;
    println!("{}", js);
    Ok(())
}

fn cmd_report_details(filename: &str, reports_dir: &Path) -> Result<()> {
    let record = DirectoryReportStore::new(reports_dir).load(filename)?;
    let js = serde_json::to_string(&json!({
        "success": true,
        "report": record.details()?,
        "raw_data": record.data,
    }))?;
    println!("{}", js);
    Ok(())
}

fn cmd_plot(args: &GenerateArgs, csv: Option<&Path>, out: &Path, max_points: usize) -> Result<()> {
    let (samples, title) = match csv {
        Some(path) => (csv_io::read_samples_csv(path)?, path.display().to_string()),
        None => {
            let generation = generate(args)?;
            (generation.samples, resolve_lead(&generation.lead).name.to_string())
        }
    };
    let (amplitudes, _) = sample_columns(&samples);
    let peaks = detect_r_peaks(&TimeSeries {
        fs: SAMPLE_RATE_HZ,
        data: amplitudes,
    });
    let fig = figure_from_samples(&title, &samples, Some(&peaks), max_points);
    PngBackend::new(out).draw(&fig)?;
    Ok(())
}

struct PngBackend<'a> {
    path: &'a Path,
    size: (u32, u32),
}

impl<'a> PngBackend<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            size: (1200, 480),
        }
    }
}

impl PlotBackend for PngBackend<'_> {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let (x_min, x_max, y_min, y_max) = fig.bounds().context("nothing to plot")?;
        let pad = ((y_max - y_min) * 0.05).max(0.05);
        let root = BitMapBackend::new(self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "ECG".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max.max(x_min + 1e-3), (y_min - pad)..(y_max + pad))?;
        {
            let mut mesh = chart.configure_mesh();
            if let Some(label) = &fig.x.label {
                mesh.x_desc(label.as_str());
            }
            if let Some(label) = &fig.y.label {
                mesh.y_desc(label.as_str());
            }
            mesh.draw()?;
        }
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let width = line.style.width.round().max(1.0) as u32;
                    let style = RGBColor(r, g, b).stroke_width(width);
                    chart.draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        style,
                    ))?;
                }
                Series::Markers(markers) => {
                    let (r, g, b) = markers.color.rgb();
                    let color = RGBColor(r, g, b).filled();
                    chart.draw_series(
                        markers
                            .points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), markers.radius, color)),
                    )?;
                }
            }
        }
        root.present()?;
        info!("wrote {}", self.path.display());
        Ok(())
    }
}
