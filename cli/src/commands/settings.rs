use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{Table, Tabled, settings::Style};

use crate::config::Config;
use fourm_core::db::setting_category;
use fourm_core::nutrition::{Goals, Profile, auto_goals, bmr, tdee};

use super::api;
use super::helpers::print_json;

/// `key=value` with the value read as a number, a boolean, or text.
fn parse_setting(pair: &str) -> Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .with_context(|| format!("Invalid setting '{pair}'. Use KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid setting '{pair}': empty key");
    }
    let raw = raw.trim();
    let value = if let Ok(n) = raw.parse::<i64>() {
        Value::from(n)
    } else if let Ok(n) = raw.parse::<f64>() {
        Value::from(n)
    } else {
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        }
    };
    Ok((key.to_string(), value))
}

/// Goals as whole-number settings, matching how seeded goals are stored.
#[allow(clippy::cast_possible_truncation)]
fn goal_settings(goals: &Goals) -> Map<String, Value> {
    let whole = |v: f64| Value::from(v.round() as i64);
    let mut map = Map::new();
    map.insert("calorie_goal".into(), whole(goals.calories));
    map.insert("protein_goal".into(), whole(goals.protein_g));
    map.insert("carbs_goal".into(), whole(goals.carbs_g));
    map.insert("fat_goal".into(), whole(goals.fat_g));
    map.insert("fiber_goal".into(), whole(goals.fiber_g));
    map
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) async fn cmd_settings_show(config: &Config, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "Category")]
        category: &'static str,
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let client = api(config)?;
    let settings = client.get_user_settings().await?;

    if json {
        return print_json(&settings);
    }

    let mut rows: Vec<SettingRow> = settings
        .iter()
        .map(|(key, value)| SettingRow {
            category: setting_category(key),
            key: key.clone(),
            value: display_value(value),
        })
        .collect();
    rows.sort_by(|a, b| a.category.cmp(b.category).then_with(|| a.key.cmp(&b.key)));

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) async fn cmd_settings_set(config: &Config, pairs: &[String], json: bool) -> Result<()> {
    if pairs.is_empty() {
        bail!("Nothing to set. Use KEY=VALUE, e.g. `fourm settings set calorie_goal=2200`");
    }
    let mut update = Map::new();
    for pair in pairs {
        let (key, value) = parse_setting(pair)?;
        update.insert(key, value);
    }

    let client = api(config)?;
    let resp = client.update_user_settings(&update).await?;

    if json {
        return print_json(&resp);
    }
    for (key, value) in &update {
        let value = display_value(value);
        println!("  {key} = {value}");
    }
    let message = &resp.message;
    println!("{message}");
    Ok(())
}

/// Derive goals from the profile (Mifflin-St Jeor BMR times activity) and save them.
pub(crate) async fn cmd_settings_auto_goals(
    config: &Config,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct AutoGoals {
        bmr: f64,
        tdee: f64,
        goals: Goals,
        saved: bool,
    }

    let client = api(config)?;
    let settings = client.get_user_settings().await?;
    let profile = Profile::from_settings(&settings);
    let Some(goals) = auto_goals(&profile) else {
        bail!(
            "Profile incomplete. Set weight_kg, height_cm and age first, e.g. `fourm settings set weight_kg=75 height_cm=180 age=30`"
        );
    };

    if !dry_run {
        client.update_user_settings(&goal_settings(&goals)).await?;
    }

    let result = AutoGoals {
        bmr: bmr(&profile),
        tdee: tdee(&profile),
        goals,
        saved: !dry_run,
    };
    if json {
        return print_json(&result);
    }

    let activity = profile.activity_level.as_str();
    println!("  BMR:  {:.0} kcal", result.bmr);
    println!("  TDEE: {:.0} kcal ({activity})", result.tdee);
    println!(
        "  Goals: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g | fiber {:.0}g",
        goals.calories, goals.protein_g, goals.carbs_g, goals.fat_g, goals.fiber_g
    );
    if dry_run {
        eprintln!("Dry run: goals not saved");
    } else {
        println!("Settings updated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_setting_types() {
        assert_eq!(
            parse_setting("calorie_goal=2200").unwrap(),
            ("calorie_goal".to_string(), json!(2200))
        );
        assert_eq!(
            parse_setting("weight_kg=72.5").unwrap(),
            ("weight_kg".to_string(), json!(72.5))
        );
        assert_eq!(
            parse_setting("notifications=false").unwrap(),
            ("notifications".to_string(), json!(false))
        );
        assert_eq!(
            parse_setting("activity_level = very_active").unwrap(),
            ("activity_level".to_string(), json!("very_active"))
        );
    }

    #[test]
    fn test_parse_setting_invalid() {
        assert!(parse_setting("calorie_goal").is_err());
        assert!(parse_setting("=2200").is_err());
    }

    #[test]
    fn test_goal_settings_keys() {
        let map = goal_settings(&Goals::default());
        assert_eq!(map.len(), 5);
        assert_eq!(map["calorie_goal"], json!(2500));
        assert_eq!(map["fiber_goal"], json!(35));
        assert_eq!(display_value(&map["calorie_goal"]), "2500");
        assert_eq!(Goals::from_settings(&map), Goals::default());
    }

    #[test]
    fn test_goal_settings_rounds_to_integers() {
        let goals = Goals {
            calories: 2123.6,
            protein_g: 149.4,
            carbs_g: 238.9,
            fat_g: 70.5,
            fiber_g: 30.0,
        };
        let map = goal_settings(&goals);
        assert_eq!(map["calorie_goal"], json!(2124));
        assert_eq!(map["protein_goal"], json!(149));
        assert_eq!(map["carbs_goal"], json!(239));
        assert_eq!(map["fat_goal"], json!(71));
        assert!(map.values().all(Value::is_i64));
        assert_eq!(display_value(&map["calorie_goal"]), "2124");
    }
}
