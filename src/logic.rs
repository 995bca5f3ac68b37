use crate::chart::{PlotChart, PlotSeries, bind_chart};
use crate::line::LineDefinition;
use crate::sampler::{LineSampler, ProfileError, ProfileReport};
use crate::table::Table;
use crate::volume::Volume;

use log::debug;

/// Runs profiles and keeps the chart that displays them.
///
/// The chart is created the first time a series is bound and reused for
/// every later run of the same instance.
#[derive(Debug, Default)]
pub struct LineProfileLogic {
    sampler: LineSampler,
    plot_chart: Option<PlotChart>,
}

impl LineProfileLogic {
    pub fn new(sampler: LineSampler) -> Self {
        Self {
            sampler,
            plot_chart: None,
        }
    }

    pub fn plot_chart(&self) -> Option<&PlotChart> {
        self.plot_chart.as_ref()
    }

    /// Fills `table` with the profile at `resolution` samples and, if a
    /// series is given, binds it to the table and shows it in the chart.
    pub fn run(
        &mut self,
        volume: &Volume,
        line: &LineDefinition,
        table: &mut Table,
        resolution: usize,
        plot_series: Option<&mut PlotSeries>,
    ) -> Result<ProfileReport, ProfileError> {
        let sampler = self.sampler.with_resolution(resolution);
        let report = sampler.compute_profile(volume, line, table)?;
        if let Some(series) = plot_series {
            self.update_chart(series, table);
        }
        Ok(report)
    }

    fn update_chart(&mut self, series: &mut PlotSeries, table: &Table) {
        bind_chart(table, series);
        let chart = self.plot_chart.get_or_insert_with(|| {
            debug!("creating plot chart for series {:?}", series.name());
            PlotChart::default()
        });
        chart.add_series(series);
    }
}
