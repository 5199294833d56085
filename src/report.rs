use std::fmt::Write;

use chrono::Datelike;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CombinedTimeline, MonthlySeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub actual_months: usize,
    pub actual_total: f64,
    pub predicted_months: usize,
    pub predicted_total: f64,
}

/// Comparison of predictions against target-year actuals from the full series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutAccuracy {
    pub months: usize,
    pub mean_absolute_error: f64,
    pub mean_absolute_percentage_error: Option<f64>,
}

pub fn summarize_by_year(timeline: &CombinedTimeline) -> Vec<YearSummary> {
    let mut summaries: Vec<YearSummary> = Vec::new();

    for row in &timeline.rows {
        let year = row.date.year();
        if summaries.last().map(|s| s.year) != Some(year) {
            summaries.push(YearSummary {
                year,
                actual_months: 0,
                actual_total: 0.0,
                predicted_months: 0,
                predicted_total: 0.0,
            });
        }
        let Some(entry) = summaries.last_mut() else {
            continue;
        };
        if let Some(actual) = row.actual {
            entry.actual_months += 1;
            entry.actual_total += actual;
        }
        if let Some(predicted) = row.predicted {
            entry.predicted_months += 1;
            entry.predicted_total += predicted;
        }
    }

    summaries
}

pub fn holdout_accuracy(
    timeline: &CombinedTimeline,
    full_series: &MonthlySeries,
) -> Option<HoldoutAccuracy> {
    let pairs: Vec<(f64, f64)> = timeline
        .predicted_rows()
        .filter_map(|row| Some((full_series.get(row.date)?, row.predicted?)))
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let months = pairs.len();
    let mean_absolute_error =
        pairs.iter().map(|(actual, predicted)| (actual - predicted).abs()).sum::<f64>()
            / months as f64;

    let percentage_errors: Vec<f64> = pairs
        .iter()
        .filter(|(actual, _)| *actual != 0.0)
        .map(|(actual, predicted)| ((actual - predicted) / actual).abs() * 100.0)
        .collect();
    let mean_absolute_percentage_error = if percentage_errors.is_empty() {
        None
    } else {
        Some(percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64)
    };

    Some(HoldoutAccuracy {
        months,
        mean_absolute_error,
        mean_absolute_percentage_error,
    })
}

/// `date,actual,predicted` with empty cells for absent values.
pub fn to_csv(timeline: &CombinedTimeline) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &timeline.rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn to_json(timeline: &CombinedTimeline) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&timeline.rows)
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn build_report(timeline: &CombinedTimeline, full_series: &MonthlySeries) -> String {
    let summaries = summarize_by_year(timeline);
    let accuracy = holdout_accuracy(timeline, full_series);

    let mut output = String::new();

    let _ = writeln!(output, "# Sales Forecast Report");
    let _ = writeln!(
        output,
        "Generated for {} using {}",
        timeline.target_year,
        timeline.model.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Yearly Totals");

    for summary in &summaries {
        if summary.predicted_months > 0 {
            let _ = writeln!(
                output,
                "- {}: {:.2} predicted across {} months",
                summary.year, summary.predicted_total, summary.predicted_months
            );
        } else if summary.actual_months > 0 {
            let _ = writeln!(
                output,
                "- {}: {:.2} actual across {} months",
                summary.year, summary.actual_total, summary.actual_months
            );
        } else {
            let _ = writeln!(output, "- {}: no sales recorded", summary.year);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Hold-out Accuracy");

    match accuracy {
        Some(accuracy) => {
            let _ = writeln!(
                output,
                "Compared against {} months of recorded {} sales: MAE {:.2}",
                accuracy.months, timeline.target_year, accuracy.mean_absolute_error
            );
            if let Some(mape) = accuracy.mean_absolute_percentage_error {
                let _ = writeln!(output, "MAPE {:.2}%", mape);
            }
        }
        None => {
            let _ = writeln!(
                output,
                "No recorded sales for {} to compare against.",
                timeline.target_year
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Timeline");
    let _ = writeln!(output, "| Month | Actual | Predicted |");
    let _ = writeln!(output, "|---|---:|---:|");
    for row in &timeline.rows {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            row.date.format("%Y-%m"),
            cell(row.actual),
            cell(row.predicted)
        );
    }

    output
}
