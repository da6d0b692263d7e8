//! Renderer-facing exports: CSV table and a Vega-Lite plot document.

use serde_json::{Value, json};
use std::io::Write;

use crate::ResultsResult;
use crate::types::{ResultSeries, Sample};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Titles and series names used by [`plot_document`].
#[derive(Debug, Clone)]
pub struct PlotLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub susceptible: String,
    pub infected: String,
    pub recovered: String,
}

impl Default for PlotLabels {
    fn default() -> Self {
        Self {
            title: "SIR Model Simulation Results".to_string(),
            x_label: "Time (days)".to_string(),
            y_label: "Population".to_string(),
            susceptible: "Susceptible".to_string(),
            infected: "Infected".to_string(),
            recovered: "Recovered".to_string(),
        }
    }
}

/// Write the series as CSV with header `t,susceptible,infected,recovered`.
pub fn write_csv<W: Write>(series: &ResultSeries, writer: W) -> ResultsResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for sample in series {
        wtr.serialize(sample)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Build a Vega-Lite v5 line chart: one curve per compartment, shared time
/// axis, legend and grid on.
pub fn plot_document(series: &ResultSeries, labels: &PlotLabels) -> Value {
    let columns: [(&String, fn(&Sample) -> f64); 3] = [
        (&labels.susceptible, |s| s.susceptible),
        (&labels.infected, |s| s.infected),
        (&labels.recovered, |s| s.recovered),
    ];

    let mut values = Vec::with_capacity(series.len() * columns.len());
    for (name, column) in columns {
        for sample in series {
            values.push(json!({
                "t": sample.t,
                "compartment": name,
                "population": column(sample),
            }));
        }
    }

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": labels.title,
        "width": 800,
        "height": 480,
        "data": { "values": values },
        "mark": { "type": "line" },
        "encoding": {
            "x": {
                "field": "t",
                "type": "quantitative",
                "title": labels.x_label,
                "axis": { "grid": true },
            },
            "y": {
                "field": "population",
                "type": "quantitative",
                "title": labels.y_label,
                "axis": { "grid": true },
            },
            "color": {
                "field": "compartment",
                "type": "nominal",
                "sort": [labels.susceptible, labels.infected, labels.recovered],
                "legend": { "title": null, "orient": "right" },
            },
        },
    })
}

/// Serialize [`plot_document`] to pretty JSON.
pub fn plot_json(series: &ResultSeries, labels: &PlotLabels) -> ResultsResult<String> {
    Ok(serde_json::to_string_pretty(&plot_document(series, labels))?)
}
