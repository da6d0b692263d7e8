use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ef_results::{Diagnostics, PlotLabels, ResultSeries, Sample, plot_json, write_csv};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn outbreak() -> ResultSeries {
    let samples = (0..=20)
        .map(|k| {
            let t = k as f64 * 0.5;
            let i = 10.0 * (0.3 * t).exp();
            let r = 0.1 * t * i;
            Sample::new(t, 10_000.0 - i - r, i, r)
        })
        .collect();
    ResultSeries::new(samples, Diagnostics::default()).expect("valid series")
}

#[test]
fn csv_file_reads_back_as_samples() {
    let dir = unique_temp_dir("ef_results_csv");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("sir.csv");

    let series = outbreak();
    write_csv(&series, File::create(&path).expect("create csv")).expect("write csv");

    let text = fs::read_to_string(&path).expect("read csv");
    assert_eq!(text.lines().next(), Some("t,susceptible,infected,recovered"));
    assert_eq!(text.lines().count(), series.len() + 1);

    let mut reader = csv::Reader::from_path(&path).expect("open csv");
    let back: Vec<Sample> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("parse csv");
    assert_eq!(back.as_slice(), series.samples());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn plot_file_is_vega_lite_json() {
    let series = outbreak();
    let labels = PlotLabels {
        title: "Test outbreak".to_string(),
        ..PlotLabels::default()
    };
    let text = plot_json(&series, &labels).expect("plot json");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("parse json");

    assert!(doc["$schema"].as_str().unwrap().contains("vega-lite/v5"));
    assert_eq!(doc["title"], "Test outbreak");
    assert_eq!(doc["encoding"]["x"]["title"], "Time (days)");
    assert_eq!(doc["encoding"]["y"]["axis"]["grid"], true);
    let values = doc["data"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 3 * series.len());
    assert!(values.iter().any(|v| v["compartment"] == "Recovered"));
}

