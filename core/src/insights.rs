use chrono::NaiveDate;

use crate::models::{Correlation, DATE_FORMAT, DailyStats, Insight, next_id};
use crate::nutrition::{Goals, pearson};

pub const DEFAULT_PERIOD_DAYS: u32 = 7;
pub const MAX_PERIOD_DAYS: u32 = 90;

/// Minimum paired days before a correlation is recorded at all.
pub const MIN_CORRELATION_SAMPLES: usize = 3;

struct MacroCheck {
    label: &'static str,
    unit: &'static str,
    current: f64,
    goal: f64,
}

impl MacroCheck {
    fn ratio(&self) -> f64 {
        if self.goal > 0.0 {
            self.current / self.goal
        } else {
            0.0
        }
    }

    fn line(&self) -> String {
        format!(
            "{}: {:.0} / {:.0} {} ({:.0}%)",
            self.label,
            self.current,
            self.goal,
            self.unit,
            self.ratio() * 100.0
        )
    }
}

/// Rule-based review of one day's totals against the user's goals.
///
/// Priority is `high` when protein is under 80% of goal or calories are more
/// than 10% over, `medium` when any macro is outside 90-110%, else `low`.
/// `confidence_score` is the share of days in the period that have a log.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn daily_review(
    stats: &DailyStats,
    goals: &Goals,
    period_start: NaiveDate,
    period_days: u32,
    logged_days: usize,
) -> Insight {
    let totals = &stats.nutrients;
    let checks = [
        MacroCheck {
            label: "Calories",
            unit: "kcal",
            current: totals.calories,
            goal: goals.calories,
        },
        MacroCheck {
            label: "Protein",
            unit: "g",
            current: totals.protein_g,
            goal: goals.protein_g,
        },
        MacroCheck {
            label: "Carbs",
            unit: "g",
            current: totals.carbs_g,
            goal: goals.carbs_g,
        },
        MacroCheck {
            label: "Fat",
            unit: "g",
            current: totals.fat_g,
            goal: goals.fat_g,
        },
    ];
    let [calories, protein, carbs, fat] = &checks;

    let priority = if protein.ratio() < 0.8 || calories.ratio() > 1.1 {
        "high"
    } else if checks.iter().any(|c| !(0.9..=1.1).contains(&c.ratio())) {
        "medium"
    } else {
        "low"
    };

    let title = if totals.calories <= 0.0 {
        format!("No meals logged for {}", stats.date)
    } else if priority == "low" {
        "Macros on target".to_string()
    } else if calories.ratio() > 1.1 {
        "Calories above goal".to_string()
    } else if protein.ratio() < 0.8 {
        "Protein below goal".to_string()
    } else {
        "Macros slightly off target".to_string()
    };

    let mut recommendations = Vec::new();
    if protein.ratio() < 0.8 {
        recommendations.push(format!(
            "Add about {:.0} g of protein, e.g. lean meat, eggs, legumes or dairy.",
            goals.protein_g - totals.protein_g
        ));
    }
    if calories.ratio() > 1.1 {
        recommendations.push(format!(
            "You are {:.0} kcal over your goal; trim portions of calorie-dense foods.",
            totals.calories - goals.calories
        ));
    } else if totals.calories > 0.0 && calories.ratio() < 0.9 {
        recommendations.push(format!(
            "{:.0} kcal remain before you reach your goal.",
            goals.calories - totals.calories
        ));
    }
    for check in [carbs, fat] {
        if check.ratio() > 1.1 {
            recommendations.push(format!("{} are above goal.", check.label));
        } else if totals.calories > 0.0 && check.ratio() < 0.9 {
            recommendations.push(format!("{} are below goal.", check.label));
        }
    }
    if totals.fiber_g < goals.fiber_g && totals.calories > 0.0 {
        recommendations.push(format!(
            "Fiber is {:.0} g of {:.0} g; add vegetables, fruit or whole grains.",
            totals.fiber_g, goals.fiber_g
        ));
    }

    let summary = checks
        .iter()
        .map(MacroCheck::line)
        .collect::<Vec<_>>()
        .join(", ");
    let mut detailed_analysis = checks
        .iter()
        .map(MacroCheck::line)
        .collect::<Vec<_>>()
        .join("\n");
    detailed_analysis.push_str(&format!(
        "\nFiber: {:.0} / {:.0} g\nDays logged: {logged_days} of {period_days}",
        totals.fiber_g, goals.fiber_g
    ));

    let period_days = period_days.max(1);
    let confidence = (logged_days as f64 / f64::from(period_days)).min(1.0);

    Insight {
        insight_id: next_id('I'),
        date_generated: stats.date.clone(),
        period_start: period_start.format(DATE_FORMAT).to_string(),
        period_end: stats.date.clone(),
        kind: "daily_review".to_string(),
        priority: priority.to_string(),
        category: "nutrition".to_string(),
        title,
        summary,
        detailed_analysis,
        recommendations: recommendations.join("\n"),
        research_references: String::new(),
        data_sources: "Daily_Logs, User_Settings".to_string(),
        confidence_score: (confidence * 100.0).round() / 100.0,
        is_read: false,
        is_applied: false,
        user_rating: None,
    }
}

/// Correlation between daily calories and body weight over `logs`.
///
/// Only days that have both a calorie total and a weight are paired.
/// Returns `None` with fewer than three pairs or a constant series.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn calorie_weight_correlation(
    logs: &[DailyStats],
    date_calculated: &str,
    period_days: u32,
) -> Option<Correlation> {
    let pairs: Vec<(f64, f64)> = logs
        .iter()
        .filter(|log| log.nutrients.calories > 0.0)
        .filter_map(|log| log.wellness.weight_kg.map(|w| (log.nutrients.calories, w)))
        .collect();
    if pairs.len() < MIN_CORRELATION_SAMPLES {
        return None;
    }
    let r = pearson(&pairs)?;
    let strength = match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        _ => "weak",
    };
    let direction = if r >= 0.0 { "positive" } else { "negative" };
    Some(Correlation {
        correlation_id: next_id('C'),
        date_calculated: date_calculated.to_string(),
        variable_1: "calories".to_string(),
        variable_2: "weight_kg".to_string(),
        correlation_coefficient: (r * 1000.0).round() / 1000.0,
        p_value: None,
        sample_size: pairs.len() as i64,
        period_days: i64::from(period_days),
        interpretation: format!(
            "{strength} {direction} relationship between daily calories and weight over {} days",
            pairs.len()
        ),
        is_significant: r.abs() >= 0.5 && pairs.len() >= 5,
    })
}
