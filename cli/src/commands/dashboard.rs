use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use fourm_core::models::{DailyStats, MEAL_TYPES, Meal};
use fourm_core::nutrients::Nutrients;
use fourm_core::nutrition::{CalorieDistribution, Goals, MacroProgress};

use super::api;
use super::helpers::{date_arg, format_amount, no_neg_zero, progress_bar};

const BAR_WIDTH: usize = 24;

#[derive(Serialize)]
struct Dashboard<'a> {
    stats: &'a DailyStats,
    goals: &'a Goals,
    progress: &'a [MacroProgress],
    distribution: CalorieDistribution,
    meals: &'a [Meal],
}

/// Meals of one type with their summed nutrients.
struct MealGroup<'a> {
    meal_type: &'a str,
    meals: Vec<&'a Meal>,
    subtotal: Nutrients,
}

fn group_meals(meals: &[Meal]) -> Vec<MealGroup<'_>> {
    MEAL_TYPES
        .iter()
        .map(|meal_type| {
            let group: Vec<&Meal> = meals.iter().filter(|m| m.meal_type == *meal_type).collect();
            let subtotal = group.iter().map(|m| m.nutrients).sum();
            MealGroup {
                meal_type: *meal_type,
                meals: group,
                subtotal,
            }
        })
        .filter(|g| !g.meals.is_empty())
        .collect()
}

/// Share of each macro in total macro calories, as whole percents.
fn distribution_percents(dist: &CalorieDistribution) -> (f64, f64, f64) {
    let total = dist.protein_kcal + dist.carbs_kcal + dist.fat_kcal;
    if total <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let pct = |v: f64| (v / total * 100.0).round();
    (pct(dist.protein_kcal), pct(dist.carbs_kcal), pct(dist.fat_kcal))
}

pub(crate) async fn cmd_dashboard(config: &Config, date: Option<&str>, json: bool) -> Result<()> {
    let client = api(config)?;
    let date = date_arg(date)?;
    let (stats, settings, meals) = tokio::try_join!(
        client.get_daily_stats(Some(&date)),
        client.get_user_settings(),
        client.get_meals(Some(&date)),
    )?;

    let goals = Goals::from_settings(&settings);
    let progress = goals.progress(&stats.nutrients);
    let distribution = CalorieDistribution::of(&stats.nutrients);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&Dashboard {
                stats: &stats,
                goals: &goals,
                progress: &progress,
                distribution,
                meals: &meals,
            })?
        );
        return Ok(());
    }

    let day = &stats.day_of_week;
    let week = stats.week_number;
    println!("=== {date} ({day}, week {week}) ===\n");

    for p in &progress {
        let name = p.name;
        let bar = progress_bar(p.percentage, BAR_WIDTH);
        let current = no_neg_zero(p.current);
        let goal = p.goal;
        let unit = p.unit;
        let pct = p.percentage;
        let status = if p.reached {
            "goal reached".to_string()
        } else {
            format!("{:.0}{unit} left", p.remaining)
        };
        println!("  {name:<9}{bar} {current:>6.0}/{goal:.0}{unit} {pct:>3.0}%  {status}");
    }

    let (pp, cp, fp) = distribution_percents(&distribution);
    let fiber = no_neg_zero(distribution.fiber_g);
    println!("\n  Calories from: protein {pp:.0}% | carbs {cp:.0}% | fat {fp:.0}% | fiber {fiber:.0}g");

    let w = &stats.wellness;
    let show = |v: Option<f64>, fmt: &dyn Fn(f64) -> String| v.map_or("-".to_string(), fmt);
    let weight = show(w.weight_kg, &|v| format!("{v:.1} kg"));
    let sleep = show(w.sleep_hours, &|v| format!("{v:.1} h"));
    let steps = show(w.steps, &|v| format!("{v:.0}"));
    let water = show(w.water_l, &|v| format!("{v:.1} L"));
    println!("  Weight: {weight} | Sleep: {sleep} | Steps: {steps} | Water: {water}\n");

    let groups = group_meals(&meals);
    if groups.is_empty() {
        eprintln!("No meals logged for {date}");
        return Ok(());
    }
    for group in &groups {
        let label = group.meal_type.to_uppercase();
        let sub_cal = no_neg_zero(group.subtotal.calories);
        println!("  {label} ({sub_cal:.0} kcal)");
        for m in &group.meals {
            let id = &m.meal_id;
            let name = m.food_name.as_deref().unwrap_or("?");
            let amount = format_amount(m.amount, &m.unit);
            let n = &m.nutrients;
            let (cal, p, c, f) = (n.calories, n.protein_g, n.carbs_g, n.fat_g);
            println!(
                "    [{id}] {name} - {amount} - {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g"
            );
        }
        println!();
    }

    Ok(())
}
