//! HTML evaluation reports for fitted classifiers.
//!
//! Renders ranking curves with plotly and a metric summary table with
//! maud; `evaluation_report` stitches both into a single self-contained
//! HTML string.

use chrono::Local;
use itertools_num::linspace;
use maud::{html, PreEscaped};
use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Histogram, Plot, Scatter};

use crate::error::Result;
use crate::metrics::{ClassificationScore, PredictionCurve};

/// Number of ROC/PR samples drawn for report plots.
const CURVE_SAMPLES: usize = 50;

/// Resample a monotone curve onto a uniform grid over `[0, 1]` with
/// step interpolation; keeps plots smooth regardless of sweep density.
fn resample_curve(curve: &[[f64; 2]], points: usize) -> (Vec<f64>, Vec<f64>) {
    let grid: Vec<f64> = linspace(0.0, 1.0, points).collect();
    if curve.is_empty() {
        let ys = vec![0.0; grid.len()];
        return (grid, ys);
    }
    let ys: Vec<f64> = grid
        .iter()
        .map(|&gx| {
            let idx = curve
                .iter()
                .position(|p| p[0] >= gx)
                .unwrap_or(curve.len() - 1);
            curve[idx][1]
        })
        .collect();
    (grid, ys)
}

/// Plot a ROC curve together with the chance diagonal.
pub fn plot_roc_curve(curve: &[[f64; 2]], title: &str) -> Plot {
    let (xs, ys) = resample_curve(curve, 200);
    let trace = Scatter::new(xs, ys).mode(Mode::Lines).name("ROC");
    let chance = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Chance")
        .line(Line::new().color("red").dash(DashType::Dash));

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("False positive rate"))
        .y_axis(Axis::new().title("True positive rate"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.add_trace(chance);
    plot.set_layout(layout);
    plot
}

/// Plot a precision-recall curve.
pub fn plot_precision_recall_curve(curve: &[[f64; 2]], title: &str) -> Plot {
    let xs: Vec<f64> = curve.iter().map(|p| p[0]).collect();
    let ys: Vec<f64> = curve.iter().map(|p| p[1]).collect();
    let trace = Scatter::new(xs, ys).mode(Mode::Lines).name("Precision-Recall");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Recall"))
        .y_axis(Axis::new().title("Precision"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

/// Histogram of prediction scores split into positive and negative ground
/// truth.
pub fn plot_score_histogram(scores: &[f64], labels: &[f64], title: &str) -> Plot {
    assert_eq!(
        scores.len(),
        labels.len(),
        "scores and labels must have the same length"
    );
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (&score, &label) in scores.iter().zip(labels.iter()) {
        if label > 0.0 {
            positive.push(score);
        } else {
            negative.push(score);
        }
    }

    let trace_pos = Histogram::new(positive).name("Positive");
    let trace_neg = Histogram::new(negative).name("Negative");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Score"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(trace_pos);
    plot.add_trace(trace_neg);
    plot.set_layout(layout);
    plot
}

/// Render a complete evaluation report: metric summary table, ROC and
/// precision-recall curves.
///
/// # Arguments
///
/// * `title` - Report heading.
/// * `score` - Confusion counts of the evaluated classifier.
/// * `curve` - Prediction curve of the same run.
///
/// # Returns
///
/// A self-contained HTML document as a string.
pub fn evaluation_report(
    title: &str,
    score: &ClassificationScore,
    curve: &PredictionCurve,
) -> Result<String> {
    let roc = curve.roc(CURVE_SAMPLES)?;
    let auc = curve.auc(CURVE_SAMPLES)?;
    let pr = curve.precision_recall_curve(CURVE_SAMPLES);

    let roc_html = plot_roc_curve(&roc, "ROC").to_inline_html(Some("roc-curve"));
    let pr_html =
        plot_precision_recall_curve(&pr, "Precision-Recall").to_inline_html(Some("pr-curve"));
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let markup = html! {
        (maud::DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                p { "Generated " (generated) }
                h2 { "Classification scores" }
                table border="1" cellpadding="4" {
                    tr {
                        th { "Examples" } th { "TP" } th { "FP" } th { "TN" } th { "FN" }
                        th { "Precision" } th { "Recall" } th { "F1" } th { "Accuracy" } th { "AUC" }
                    }
                    tr {
                        td { (score.all()) }
                        td { (score.tp) }
                        td { (score.fp) }
                        td { (score.tn) }
                        td { (score.fn_) }
                        td { (format!("{:.4}", score.precision())) }
                        td { (format!("{:.4}", score.recall())) }
                        td { (format!("{:.4}", score.f1())) }
                        td { (format!("{:.4}", score.accuracy())) }
                        td { (format!("{:.4}", auc)) }
                    }
                }
                h2 { "Curves" }
                div { (PreEscaped(roc_html)) }
                div { (PreEscaped(pr_html)) }
            }
        }
    };
    Ok(markup.into_string())
}
