use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};
use std::process;

use crate::config::Config;
use fourm_core::models::{FoodPatch, NewFood};
use fourm_core::nutrients::{NUTRIENT_COLUMNS, Nutrients};

use super::api;
use super::helpers::{json_error, print_food_table, print_json};

/// Descriptive and nutrient columns shared by `foods add` and `foods update`.
/// Nutrient values are per serving.
#[derive(Args, Debug, Default)]
pub(crate) struct FoodFields {
    /// Brand name
    #[arg(long)]
    pub brand: Option<String>,
    /// Category (e.g. Protein, Grains, Fruits)
    #[arg(long)]
    pub category: Option<String>,
    /// Barcode
    #[arg(long)]
    pub barcode: Option<String>,
    /// Serving size (default: 100)
    #[arg(long)]
    pub serving_size: Option<f64>,
    /// Serving unit (default: g)
    #[arg(long)]
    pub serving_unit: Option<String>,
    /// Calories per serving
    #[arg(long)]
    pub calories: Option<f64>,
    /// Protein (g) per serving
    #[arg(long)]
    pub protein: Option<f64>,
    /// Carbs (g) per serving
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Fat (g) per serving
    #[arg(long)]
    pub fat: Option<f64>,
    /// Fiber (g) per serving
    #[arg(long)]
    pub fiber: Option<f64>,
    /// Any other nutrient column, e.g. `--set iron_mg=2.5` (repeatable)
    #[arg(long = "set", value_name = "COLUMN=VALUE")]
    pub extra: Vec<String>,
}

impl FoodFields {
    /// Nutrient columns given on the command line, in column order for the named flags
    /// followed by `--set` values.
    fn nutrient_values(&self) -> Result<Vec<(String, f64)>> {
        let named = [
            ("calories", self.calories),
            ("protein_g", self.protein),
            ("carbs_g", self.carbs),
            ("fat_g", self.fat),
            ("fiber_g", self.fiber),
        ];
        let mut values: Vec<(String, f64)> = named
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column.to_string(), v)))
            .collect();
        for pair in &self.extra {
            values.push(parse_column_value(pair)?);
        }
        Ok(values)
    }
}

/// Parse `column=value` for a nutrient column or `water_g`.
fn parse_column_value(pair: &str) -> Result<(String, f64)> {
    let (column, value) = pair
        .split_once('=')
        .with_context(|| format!("Invalid --set '{pair}'. Use COLUMN=VALUE"))?;
    let column = column.trim();
    if column != "water_g" && !NUTRIENT_COLUMNS.contains(&column) {
        bail!("Unknown nutrient column '{column}'");
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid number for {column}: '{value}'"))?;
    Ok((column.to_string(), value))
}

fn build_new_food(name: &str, fields: &FoodFields) -> Result<NewFood> {
    let mut nutrients = Nutrients::default();
    let mut water_g = 0.0;
    for (column, value) in fields.nutrient_values()? {
        if column == "water_g" {
            water_g = value;
        } else {
            nutrients.set(&column, value);
        }
    }
    Ok(NewFood {
        food_name: name.to_string(),
        brand: fields.brand.clone(),
        category: fields.category.clone(),
        barcode: fields.barcode.clone(),
        serving_size: fields.serving_size.unwrap_or(100.0),
        serving_unit: fields
            .serving_unit
            .clone()
            .unwrap_or_else(|| "g".to_string()),
        nutrients,
        water_g,
        source: None,
    })
}

fn build_patch(
    food_id: &str,
    name: Option<String>,
    verified: Option<bool>,
    fields: &FoodFields,
) -> Result<FoodPatch> {
    let mut columns = Map::new();
    let mut water_g = None;
    for (column, value) in fields.nutrient_values()? {
        if column == "water_g" {
            water_g = Some(value);
        } else {
            columns.insert(column, Value::from(value));
        }
    }
    Ok(FoodPatch {
        food_id: food_id.to_string(),
        food_name: name,
        brand: fields.brand.clone(),
        category: fields.category.clone(),
        barcode: fields.barcode.clone(),
        serving_size: fields.serving_size,
        serving_unit: fields.serving_unit.clone(),
        water_g,
        is_verified: verified,
        source: None,
        columns,
    })
}

pub(crate) async fn cmd_food_list(
    config: &Config,
    category: Option<&str>,
    verified: bool,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let client = api(config)?;
    let foods = client.get_food_database(category, verified, limit).await?;

    if json {
        return print_json(&foods);
    }
    if foods.is_empty() {
        eprintln!("No foods found");
        process::exit(2);
    }
    print_food_table(&foods);
    Ok(())
}

pub(crate) async fn cmd_food_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let client = api(config)?;
    let foods = client.search_foods(query).await?;

    if json {
        return print_json(&foods);
    }
    if foods.is_empty() {
        eprintln!("No foods matching '{query}'");
        process::exit(2);
    }
    print_food_table(&foods);
    Ok(())
}

pub(crate) async fn cmd_food_add(
    config: &Config,
    name: &str,
    fields: &FoodFields,
    json: bool,
) -> Result<()> {
    let food = build_new_food(name, fields)?;
    let client = api(config)?;
    let resp = client.add_food(&food).await?;

    if json {
        return print_json(&resp);
    }
    let id = resp.food_id.as_deref().unwrap_or("?");
    let cal = food.nutrients.calories;
    let serving = food.serving_size;
    let unit = &food.serving_unit;
    println!("Added food [{id}]: {name} ({cal:.0} kcal per {serving}{unit})");
    Ok(())
}

pub(crate) async fn cmd_food_update(
    config: &Config,
    food_id: &str,
    name: Option<String>,
    verified: Option<bool>,
    fields: &FoodFields,
    json: bool,
) -> Result<()> {
    let patch = build_patch(food_id, name, verified, fields)?;
    let client = api(config)?;
    let resp = client.update_food(&patch).await?;

    if json {
        return print_json(&resp);
    }
    let message = &resp.message;
    println!("{message}: {food_id}");
    Ok(())
}

pub(crate) async fn cmd_food_delete(config: &Config, food_id: &str, json: bool) -> Result<()> {
    let client = api(config)?;
    match client.delete_food(food_id).await {
        Ok(resp) if json => print_json(&resp),
        Ok(resp) => {
            let message = &resp.message;
            println!("{message}: {food_id}");
            Ok(())
        }
        Err(e) if json => {
            println!("{}", json_error(&e.to_string()));
            process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_value() {
        assert_eq!(
            parse_column_value("iron_mg=2.5").unwrap(),
            ("iron_mg".to_string(), 2.5)
        );
        assert_eq!(
            parse_column_value(" water_g = 70 ").unwrap(),
            ("water_g".to_string(), 70.0)
        );
        assert!(parse_column_value("iron_mg").is_err());
        assert!(parse_column_value("food_name=Oats").is_err());
        assert!(parse_column_value("iron_mg=lots").is_err());
    }

    #[test]
    fn test_build_new_food_defaults() {
        let fields = FoodFields {
            calories: Some(389.0),
            protein: Some(16.9),
            extra: vec!["iron_mg=4.7".to_string(), "water_g=8".to_string()],
            ..FoodFields::default()
        };
        let food = build_new_food("Oats", &fields).unwrap();
        assert_eq!(food.serving_size, 100.0);
        assert_eq!(food.serving_unit, "g");
        assert_eq!(food.nutrients.calories, 389.0);
        assert_eq!(food.nutrients.protein_g, 16.9);
        assert_eq!(food.nutrients.iron_mg, 4.7);
        assert_eq!(food.water_g, 8.0);
    }

    #[test]
    fn test_build_patch_only_given_columns() {
        let fields = FoodFields {
            fat: Some(3.0),
            serving_size: Some(50.0),
            ..FoodFields::default()
        };
        let patch = build_patch("F001", None, Some(true), &fields).unwrap();
        assert_eq!(patch.food_id, "F001");
        assert_eq!(patch.serving_size, Some(50.0));
        assert_eq!(patch.is_verified, Some(true));
        assert!(patch.food_name.is_none());
        assert_eq!(patch.columns.len(), 1);
        assert_eq!(patch.columns["fat_g"], 3.0);
    }
}
