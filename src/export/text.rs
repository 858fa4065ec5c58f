use super::ExportError;
use crate::load_model::LoadSnapshot;
use crate::models::DailyLoadRecord;
use crate::summary::{ActivitySummary, GoalProgress, VolumeTrend, YearTotals};
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SeriesTableRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Stress")]
    stress: String,
    #[tabled(rename = "Fitness")]
    fitness: String,
    #[tabled(rename = "Fatigue")]
    fatigue: String,
    #[tabled(rename = "Form")]
    form: String,
    #[tabled(rename = "ACR")]
    acr: String,
}

impl From<&DailyLoadRecord> for SeriesTableRow {
    fn from(record: &DailyLoadRecord) -> Self {
        SeriesTableRow {
            date: record.date.format("%Y-%m-%d").to_string(),
            stress: format!("{:.1}", record.stress),
            fitness: format!("{:.1}", record.fitness),
            fatigue: format!("{:.1}", record.fatigue),
            form: format!("{:.1}", record.form),
            acr: record
                .acr
                .map(|acr| format!("{:.2}", acr))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Render the load series as a console table
pub fn series_table(records: &[DailyLoadRecord]) -> String {
    let rows: Vec<SeriesTableRow> = records.iter().map(SeriesTableRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Human-readable status report for a single day
pub fn status_report(snapshot: &LoadSnapshot) -> Result<String, ExportError> {
    let record = &snapshot.record;
    let mut report = String::new();

    writeln!(report, "TRAINING LOAD STATUS ({})", record.date.format("%Y-%m-%d"))?;
    writeln!(report, "-")?;
    writeln!(report, "Fitness (chronic load): {:.1}", record.fitness)?;
    writeln!(report, "Fatigue (acute load): {:.1}", record.fatigue)?;
    writeln!(report, "Form: {:.1}", record.form)?;
    match record.acr {
        Some(acr) => writeln!(report, "Acute:chronic ratio: {:.2}", acr)?,
        None => writeln!(report, "Acute:chronic ratio: n/a (no chronic load)")?,
    }
    writeln!(report)?;
    writeln!(
        report,
        "Load Status: {} ({})",
        snapshot.ratio_status.label(),
        snapshot.ratio_status.description()
    )?;
    writeln!(report, "Form Status: {}", snapshot.form_interpretation.description())?;
    writeln!(report)?;
    writeln!(report, "Recommendations:")?;
    writeln!(report, "• {}", snapshot.ratio_status.recommendation())?;
    writeln!(report, "• {}", snapshot.form_interpretation.recommendation())?;

    Ok(report)
}

#[derive(Tabled)]
struct TrendTableRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Activities")]
    activities: usize,
    #[tabled(rename = "Volume")]
    volume: String,
}

/// Render per-period volume as a console table
pub fn trend_table(trend: &VolumeTrend) -> String {
    let rows: Vec<TrendTableRow> = trend
        .periods
        .iter()
        .map(|period| TrendTableRow {
            period: period.period_start.format("%Y-%m-%d").to_string(),
            activities: period.activities,
            volume: trend.unit.format(period.volume),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn progress_bar(progress: &GoalProgress, width: usize) -> String {
    let filled = (progress.fraction() * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled.min(width)))
}

fn write_totals(report: &mut String, totals: &YearTotals) -> Result<(), ExportError> {
    writeln!(report, "Activities: {}", totals.activities)?;
    writeln!(report, "Running Distance: {:.1} km", totals.running_km)?;
    writeln!(report, "Half Marathons: {}", totals.half_marathons)?;
    writeln!(report, "Active Days: {}", totals.active_days)?;
    writeln!(report, "Strength Sessions: {}", totals.strength_sessions)?;
    writeln!(report, "Elevation Gain: {:.0} m", totals.elevation_gain_m)?;
    if let Some(peak) = totals.peak_hr {
        writeln!(report, "Peak Heart Rate: {} bpm", peak)?;
    }
    Ok(())
}

/// Year progress (or totals, for a year without targets) followed by the volume trend
pub fn summary_report(summary: &ActivitySummary) -> Result<String, ExportError> {
    let mut report = String::new();

    match &summary.progress {
        Some(progress) => {
            writeln!(report, "PROJECT {} PROGRESS", summary.totals.year)?;
            writeln!(report, "-")?;
            for goal in progress {
                writeln!(
                    report,
                    "{:<18} {:>8.1} / {:<8.0} {} {:>3.0}%",
                    goal.goal,
                    goal.actual,
                    goal.target,
                    progress_bar(goal, 20),
                    goal.fraction() * 100.0
                )?;
            }
            writeln!(report)?;
            write_totals(&mut report, &summary.totals)?;
        }
        None => {
            writeln!(report, "PROJECT {} TOTALS", summary.totals.year)?;
            writeln!(report, "-")?;
            write_totals(&mut report, &summary.totals)?;
        }
    }

    let trend = &summary.trend;
    writeln!(report)?;
    writeln!(
        report,
        "{} VOLUME, {} ({} to {})",
        trend.category.to_string().to_uppercase(),
        trend.window,
        trend.start.format("%Y-%m-%d"),
        trend.end.format("%Y-%m-%d")
    )?;
    if trend.is_empty() {
        writeln!(report, "No activities.")?;
    } else {
        writeln!(report, "{}", trend_table(trend))?;
        writeln!(report, "Total: {}", trend.unit.format(trend.total()))?;
    }

    Ok(report)
}
