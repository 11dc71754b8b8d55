use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use crate::config::Config;
use fourm_core::models::{Food, NewMeal, validate_meal_type};
use fourm_core::nutrition::{convert_to_grams, scale_factor};

use super::helpers::{
    date_arg, format_amount, json_error, no_neg_zero, parse_amount, print_json, truncate,
};
use super::{api, resolve_food};

/// Express `qty unit` in the food's serving unit.
/// A missing unit means the serving unit. Weights and volumes convert through grams
/// when the food is measured in grams or millilitres.
fn amount_in_serving_unit(qty: f64, unit: Option<&str>, food: &Food) -> Result<f64> {
    let serving_unit = food.serving_unit.as_str();
    let Some(unit) = unit else {
        return Ok(qty);
    };
    if unit.eq_ignore_ascii_case(serving_unit) {
        return Ok(qty);
    }
    let base =
        convert_to_grams(1.0, serving_unit).filter(|(g, _)| (*g - 1.0).abs() < f64::EPSILON);
    match (base, convert_to_grams(qty, unit)) {
        (Some(_), Some((grams, approximate))) => {
            if approximate {
                eprintln!(
                    "Note: {qty} {unit} ≈ {grams:.0}{serving_unit} (approximate, assumes water density)"
                );
            }
            Ok(grams)
        }
        _ => bail!("Cannot convert {unit} to {serving_unit} for {}", food.food_name),
    }
}

fn meal_for(
    food: &Food,
    amount: f64,
    meal_type: String,
    date: String,
    notes: Option<String>,
) -> NewMeal {
    let factor = scale_factor(amount, food.serving_size);
    NewMeal {
        date: Some(date),
        meal_type,
        food_id: Some(food.food_id.clone()),
        food_name: Some(food.food_name.clone()),
        amount: Some(amount),
        unit: Some(food.serving_unit.clone()),
        nutrients: food.nutrients.scaled(factor),
        notes,
    }
}

pub(crate) async fn cmd_log(
    config: &Config,
    food_query: &str,
    amount_str: &str,
    meal: &str,
    date: Option<&str>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type = validate_meal_type(meal)?;
    let (qty, unit) = parse_amount(amount_str)?;
    let date = date_arg(date)?;
    let client = api(config)?;

    let food = match resolve_food(&client, food_query).await {
        Ok(food) => food,
        Err(e) if json => {
            println!("{}", json_error(&format!("{e:#}")));
            process::exit(2);
        }
        Err(e) => return Err(e),
    };
    let amount = amount_in_serving_unit(qty, unit.as_deref(), &food)?;
    let meal = meal_for(&food, amount, meal_type, date, notes);
    let resp = client.log_meal(&meal).await?;

    if json {
        return print_json(&resp);
    }
    let id = resp.meal_id.as_deref().unwrap_or("?");
    let name = &food.food_name;
    let meal_type = &meal.meal_type;
    let serving = format_amount(amount, &food.serving_unit);
    let cal = meal.nutrients.calories;
    println!("Logged [{id}]: {name} {serving} for {meal_type} - {cal:.0} kcal");
    Ok(())
}

pub(crate) async fn cmd_meals(config: &Config, date: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Meal")]
        meal_type: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let client = api(config)?;
    let date = date_arg(date)?;
    let meals = client.get_meals(Some(&date)).await?;

    if json {
        return print_json(&meals);
    }
    if meals.is_empty() {
        eprintln!("No meals logged for {date}");
        process::exit(2);
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: m.meal_id.clone(),
            meal_type: m.meal_type.clone(),
            food: truncate(m.food_name.as_deref().unwrap_or("?"), 35),
            amount: format_amount(m.amount, &m.unit),
            calories: format!("{:.0}", no_neg_zero(m.nutrients.calories)),
            protein: format!("{:.0}g", no_neg_zero(m.nutrients.protein_g)),
            carbs: format!("{:.0}g", no_neg_zero(m.nutrients.carbs_g)),
            fat: format!("{:.0}g", no_neg_zero(m.nutrients.fat_g)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
