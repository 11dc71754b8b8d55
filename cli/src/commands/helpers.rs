use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fourm_core::models::{DATE_FORMAT, Food};

/// Parse an amount with an optional unit, returning `(quantity, unit)`.
/// Accepts: "150", "150g", "500ml", "500 ml", "2 tbsp", "1.5 oz", etc.
pub(crate) fn parse_amount(s: &str) -> Result<(f64, Option<String>)> {
    let s = s.trim();

    if let Ok(qty) = s.parse::<f64>() {
        return Ok((positive(qty, s)?, None));
    }

    if let Some((qty, unit)) = split_number_unit(s) {
        return Ok((positive(qty, s)?, Some(unit.to_lowercase())));
    }

    let parts: Vec<&str> = s.splitn(2, char::is_whitespace).collect();
    if parts.len() == 2 {
        let qty: f64 = parts[0]
            .parse()
            .with_context(|| format!("Invalid quantity: '{s}'"))?;
        return Ok((positive(qty, s)?, Some(parts[1].trim().to_lowercase())));
    }

    bail!("Invalid amount: '{s}'. Use '150', '150g', '2 tbsp', etc.")
}

fn positive(qty: f64, s: &str) -> Result<f64> {
    if qty <= 0.0 {
        bail!("Amount must be greater than 0 (got '{s}')");
    }
    Ok(qty)
}

/// Split "500ml" or "2.5tbsp" into (500.0, "ml") or (2.5, "tbsp").
fn split_number_unit(s: &str) -> Option<(f64, &str)> {
    let idx = s.find(|c: char| c.is_alphabetic())?;
    if idx == 0 {
        return None;
    }
    let (num_part, unit_part) = s.split_at(idx);
    let qty: f64 = num_part.trim().parse().ok()?;
    Some((qty, unit_part))
}

pub(crate) fn parse_date(date_str: Option<&str>) -> Result<NaiveDate> {
    match date_str {
        None | Some("today") => Ok(Local::now().date_naive()),
        Some("yesterday") => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
        Some("tomorrow") => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| {
            format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
        }),
    }
}

/// Date argument as the server expects it.
pub(crate) fn date_arg(date_str: Option<&str>) -> Result<String> {
    Ok(parse_date(date_str)?.format(DATE_FORMAT).to_string())
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_food_table(foods: &[Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "✓")]
        verified: &'static str,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.food_id.clone(),
            name: truncate(&f.food_name, 35),
            category: f
                .category
                .as_deref()
                .map(|c| truncate(c, 15))
                .unwrap_or_default(),
            serving: format_amount(f.serving_size, &f.serving_unit),
            calories: format!("{:.0}", no_neg_zero(f.nutrients.calories)),
            protein: format!("{:.1}", no_neg_zero(f.nutrients.protein_g)),
            carbs: format!("{:.1}", no_neg_zero(f.nutrients.carbs_g)),
            fat: format!("{:.1}", no_neg_zero(f.nutrients.fat_g)),
            verified: if f.is_verified { "yes" } else { "" },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(5..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `"150g"`, `"1.5 cup"`.
pub(crate) fn format_amount(amount: f64, unit: &str) -> String {
    let qty = if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount}")
    };
    if unit.chars().count() <= 2 {
        format!("{qty}{unit}")
    } else {
        format!("{qty} {unit}")
    }
}

/// `[#########-----------]` filled to `percentage` (0-100).
pub(crate) fn progress_bar(percentage: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_plain() {
        assert_eq!(parse_amount("150").unwrap(), (150.0, None));
        assert_eq!(parse_amount(" 2.5 ").unwrap(), (2.5, None));
    }

    #[test]
    fn test_parse_amount_with_unit() {
        assert_eq!(parse_amount("150g").unwrap(), (150.0, Some("g".to_string())));
        assert_eq!(
            parse_amount("500ML").unwrap(),
            (500.0, Some("ml".to_string()))
        );
        assert_eq!(
            parse_amount("2 tbsp").unwrap(),
            (2.0, Some("tbsp".to_string()))
        );
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-50g").is_err());
        assert!(parse_amount("two cups").is_err());
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
        assert_eq!(parse_date(Some("today")).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday")).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow")).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(
            parse_date(Some("2024-01-15")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(date_arg(Some("2024-01-15")).unwrap(), "2024-01-15");
        assert!(parse_date(Some("15/01/2024")).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(150.0, "g"), "150g");
        assert_eq!(format_amount(1.5, "cup"), "1.5 cup");
        assert_eq!(format_amount(250.0, "ml"), "250ml");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]");
        assert_eq!(progress_bar(50.0, 10), "[#####-----]");
        assert_eq!(progress_bar(100.0, 10), "[##########]");
        assert_eq!(progress_bar(180.0, 4), "[####]");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }
}
