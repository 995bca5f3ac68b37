use std::{io, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::info;
use volume_line_profile::{
    DISTANCE_COLUMN, INTENSITY_COLUMN, Interpolation, LineDefinition, LineProfileLogic,
    LineSampler, PlotSeries, SortBy, Table, VolumeLoader, render_series,
};

const MAX_RESOLUTION: usize = 1000;

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    ImagePosition,
    TablePosition,
    InstanceNumber,
    None,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::ImagePosition => SortBy::ImagePositionPatient,
            SortArg::TablePosition => SortBy::TablePosition,
            SortArg::InstanceNumber => SortBy::InstanceNumber,
            SortArg::None => SortBy::None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InterpolationArg {
    Trilinear,
    Nearest,
}

impl From<InterpolationArg> for Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Trilinear => Interpolation::Trilinear,
            InterpolationArg::Nearest => Interpolation::Nearest,
        }
    }
}

/// Sample the intensity of a DICOM series along a line and print it as CSV.
#[derive(Parser)]
#[command(name = "line-profile")]
struct Cli {
    /// Directory holding the .dcm files of one series
    dicom_dir: PathBuf,
    /// Start point in patient coordinates (mm)
    #[arg(
        long,
        required = true,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true
    )]
    start: Vec<f64>,
    /// End point in patient coordinates (mm)
    #[arg(
        long,
        required = true,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true
    )]
    end: Vec<f64>,
    /// Number of points sampled along the line
    #[arg(long, default_value_t = 100)]
    resolution: usize,
    #[arg(long, value_enum, default_value = "image-position")]
    sort_by: SortArg,
    #[arg(long, value_enum, default_value = "trilinear")]
    interpolation: InterpolationArg,
    /// Intensity written for samples outside the volume
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    fill_value: f64,
    /// Also render the profile chart to this PNG file
    #[arg(long)]
    chart: Option<PathBuf>,
}

fn point(values: &[f64], name: &str) -> Result<[f64; 3]> {
    <[f64; 3]>::try_from(values).with_context(|| format!("--{name} takes three coordinates"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !(2..=MAX_RESOLUTION).contains(&cli.resolution) {
        bail!("--resolution must be between 2 and {MAX_RESOLUTION}");
    }

    let volume = VolumeLoader::load_from_directory(&cli.dicom_dir, cli.sort_by.into())
        .with_context(|| format!("loading {}", cli.dicom_dir.display()))?;
    let line = LineDefinition::new(point(&cli.start, "start")?, point(&cli.end, "end")?);

    let sampler = LineSampler::default()
        .with_interpolation(cli.interpolation.into())
        .with_fill_value(cli.fill_value);
    let mut logic = LineProfileLogic::new(sampler);
    let mut table = Table::new("profile");
    let mut series = PlotSeries::new("Intensity profile");

    let report = logic.run(&volume, &line, &mut table, cli.resolution, Some(&mut series))?;
    if !report.warnings.is_empty() {
        info!("profile computed with {} warning(s)", report.warnings.len());
    }

    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([DISTANCE_COLUMN, INTENSITY_COLUMN])?;
    for (distance, intensity) in report.series.distances.iter().zip(&report.series.intensities) {
        writer.write_record([distance.to_string(), intensity.to_string()])?;
    }
    writer.flush()?;

    if let Some(path) = cli.chart {
        let img = render_series(&table, &series, 800, 400).context("chart has no data")?;
        img.save(&path)
            .with_context(|| format!("writing chart to {}", path.display()))?;
    }

    Ok(())
}
