use plotters::style::IntoFont;
use seriesplot::batch::{run_batch, BatchConfig};
use seriesplot::{ChartSpec, LegendPosition, NamedSeries, SeriesError, Ticks, XAxis};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Text layout needs a system font; machines without one skip the drawing tests.
fn fonts_available() -> bool {
    let ok = ("sans-serif", 12).into_font().box_size("0").is_ok();
    if !ok {
        eprintln!("no sans-serif font available, skipping");
    }
    ok
}

/// svg text elements hold their content on a line of its own
fn svg_text(label: &str) -> String {
    format!(">\n{}\n</text>", label)
}

fn temperature_chart(output: &Path) -> ChartSpec {
    let base: Vec<f64> = (0..210).map(|i| 20. + (i as f64 / 15.).sin()).collect();
    let lower: Vec<f64> = base.iter().map(|v| v - 1.5).collect();
    let upper: Vec<f64> = base.iter().map(|v| v + 2.).collect();
    ChartSpec::new(
        "Variation of temperature wrt different offset intervals",
        output,
        XAxis::Range { start: 90, end: 300 },
    )
    .with_series(NamedSeries::new("temp_off1", base), "l_o = -1")
    .with_series(NamedSeries::new("temp_off", lower), "l_o = -1.5")
    .with_series(NamedSeries::new("temp_off2", upper), "l_o = -2")
}

#[test]
fn render_is_idempotent() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("temperature.png");
    let spec = temperature_chart(&out);

    spec.render().unwrap();
    let first = fs::read(&out).unwrap();
    spec.render().unwrap();
    let second = fs::read(&out).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn explicit_ticks_are_drawn_in_order() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("ticks.svg");
    let ticks = Ticks::new(
        vec![0., 1., 2.],
        vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
    )
    .unwrap();
    ChartSpec::new("ticks", &out, XAxis::Range { start: 0, end: 3 })
        .with_series(NamedSeries::new("s", vec![1., 3., 2.]), "s")
        .with_ticks(ticks)
        .render()
        .unwrap();

    let svg = fs::read_to_string(&out).unwrap();
    let a = svg.find(&svg_text("alpha")).expect("alpha label");
    let b = svg.find(&svg_text("beta")).expect("beta label");
    let c = svg.find(&svg_text("gamma")).expect("gamma label");
    assert!(a < b && b < c);
}

fn stress_chart(output: &Path, series: usize) -> ChartSpec {
    let names = ["stress_off1", "stress_off", "stress_off2"];
    let legends = ["l_o = -1", "l_o = -1.5", "l_o = -2"];
    let mut spec = ChartSpec::new("Variation of stress", output, XAxis::Range { start: 90, end: 220 });
    for i in 0..series {
        let values: Vec<f64> = (0..130).map(|x| (x as f64 / 20.).sin() + i as f64).collect();
        spec = spec.with_series(NamedSeries::new(names[i], values), legends[i]);
    }
    spec
}

#[test]
fn series_are_drawn_in_list_order() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("stress.svg");
    stress_chart(&out, 3)
        .with_legend(false, LegendPosition::Best)
        .render()
        .unwrap();

    let svg = fs::read_to_string(&out).unwrap().to_uppercase();
    // tab10 blue, orange, green
    let colors = ["STROKE=\"#1F77B4\"", "STROKE=\"#FF7F0E\"", "STROKE=\"#2CA02C\""];
    for pair in colors.windows(2) {
        let last_below = svg.rfind(pair[0]).expect("lower series drawn");
        let first_above = svg.find(pair[1]).expect("upper series drawn");
        assert!(last_below < first_above, "{} drawn after {}", pair[0], pair[1]);
    }
}

#[test]
fn legend_only_with_several_series_and_the_flag() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    let single = dir.path().join("single.svg");
    stress_chart(&single, 1)
        .with_legend(true, LegendPosition::UpperLeft)
        .render()
        .unwrap();
    assert!(!fs::read_to_string(&single).unwrap().contains(&svg_text("l_o = -1")));

    let disabled = dir.path().join("disabled.svg");
    stress_chart(&disabled, 2)
        .with_legend(false, LegendPosition::UpperLeft)
        .render()
        .unwrap();
    let svg = fs::read_to_string(&disabled).unwrap();
    assert!(!svg.contains(&svg_text("l_o = -1")));
    assert!(!svg.contains(&svg_text("l_o = -1.5")));

    let enabled = dir.path().join("enabled.svg");
    stress_chart(&enabled, 2)
        .with_legend(true, LegendPosition::UpperLeft)
        .render()
        .unwrap();
    let svg = fs::read_to_string(&enabled).unwrap();
    assert!(svg.contains(&svg_text("l_o = -1")));
    assert!(svg.contains(&svg_text("l_o = -1.5")));
}

#[test]
fn single_series_with_nan_gap_and_explicit_legend() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("wrn_100.png");
    let mut values: Vec<f64> = (0..120).map(|i| (i % 7) as f64).collect();
    values[40] = f64::NAN;
    values[41] = f64::NAN;
    ChartSpec::new("IDS warning level for tau = 100", &out, XAxis::Range { start: 90, end: 210 })
        .with_series(NamedSeries::new("wrn_tau", values), "tau = 100")
        .with_legend(true, LegendPosition::LowerRight)
        .render()
        .unwrap();
    assert!(out.exists());
}

#[test]
fn axis_mismatch_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mismatch.png");
    let err = ChartSpec::new("mismatch", &out, XAxis::Range { start: 0, end: 10 })
        .with_series(NamedSeries::new("fifty", vec![0.; 50]), "fifty")
        .render()
        .unwrap_err();
    assert!(matches!(err, SeriesError::AxisMismatch { len: 50, axis_len: 10, .. }));
    assert!(!out.exists());
}

#[test]
fn batch_renders_every_chart() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    for (name, offset) in [("testIntervalWarn.csv", 0.), ("testIntervalSt.csv", 0.25)].iter() {
        let mut f = fs::File::create(dir.path().join(name)).unwrap();
        writeln!(f, "# distance per step").unwrap();
        for i in 0..50 {
            writeln!(f, "{}", (i as f64 / 10.).cos() + offset).unwrap();
        }
    }
    let batch = r#"
output_dir = "plots"

[[chart]]
id = "time_wrn"
title = "Evaluation of distances wrt warning over time"
output = "time_wrn.png"
x_range = [0, 50]

[[chart.series]]
path = "testIntervalWarn.csv"
field = "wrn_max"

[[chart]]
id = "time"
title = "Evaluation of distances over time"
output = "time.svg"
x_range = [0, 50]
legend_position = "upper left"

[[chart.series]]
path = "testIntervalWarn.csv"
field = "wrn_max"
label = "warning"

[[chart.series]]
path = "testIntervalSt.csv"
field = "stress_max"
label = "stress"

[chart.difference]
left = "wrn_max"
right = "stress_max"
label = "difference"
"#;
    let path = dir.path().join("charts.toml");
    fs::write(&path, batch).unwrap();

    let config = BatchConfig::load(&path).unwrap();
    let report = run_batch(&config);
    assert!(report.all_ok(), "{:?}", report);
    assert!(dir.path().join("plots/time_wrn.png").exists());
    assert!(dir.path().join("plots/time.svg").exists());

    let time = report.outcomes[1].result.as_ref().unwrap();
    assert_eq!(time.points, 50);
    let d = time.difference.as_ref().unwrap();
    assert!((d.max - 0.25).abs() < 1e-9);
    assert!((d.mean - 0.25).abs() < 1e-9);
}
