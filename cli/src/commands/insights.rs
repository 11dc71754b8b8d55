use anyhow::Result;
use serde::Serialize;
use std::process;

use crate::config::Config;
use fourm_core::models::{Correlation, Insight, NewInsightRequest};

use super::api;
use super::helpers::{date_arg, print_json};

fn print_insight(insight: &Insight) {
    let priority = insight.priority.to_uppercase();
    let title = &insight.title;
    let id = &insight.insight_id;
    let (start, end) = (&insight.period_start, &insight.period_end);
    println!("[{priority}] {title} ({id}, {start} to {end})");
    println!("  {}", insight.summary);
    if !insight.detailed_analysis.is_empty() {
        println!("  {}", insight.detailed_analysis);
    }
    for line in insight.recommendations.lines().filter(|l| !l.trim().is_empty()) {
        println!("  - {}", line.trim());
    }
    let confidence = insight.confidence_score * 100.0;
    println!("  confidence {confidence:.0}%\n");
}

fn print_correlation(c: &Correlation) {
    let r = c.correlation_coefficient;
    let n = c.sample_size;
    let marker = if c.is_significant { " *" } else { "" };
    println!(
        "  {} vs {}: r = {r:.3} (n = {n}, {} days){marker}",
        c.variable_1, c.variable_2, c.period_days
    );
    println!("    {}", c.interpretation);
}

pub(crate) async fn cmd_insights_show(
    config: &Config,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct InsightsPage {
        insights: Vec<Insight>,
        correlations: Vec<Correlation>,
    }

    let client = api(config)?;
    let date = date_arg(date)?;
    let (insights, correlations) = tokio::try_join!(
        client.get_ai_insights(Some(&date)),
        client.get_correlations(),
    )?;

    if json {
        return print_json(&InsightsPage {
            insights,
            correlations,
        });
    }
    if insights.is_empty() && correlations.is_empty() {
        eprintln!("No insights for {date}. Run `fourm insights generate` first");
        process::exit(2);
    }

    for insight in &insights {
        print_insight(insight);
    }
    if !correlations.is_empty() {
        println!("Correlations:");
        for c in &correlations {
            print_correlation(c);
        }
    }
    Ok(())
}

pub(crate) async fn cmd_insights_generate(
    config: &Config,
    date: Option<&str>,
    period_days: Option<u32>,
    json: bool,
) -> Result<()> {
    let client = api(config)?;
    let date = date_arg(date)?;
    let resp = client
        .generate_ai_insight(&NewInsightRequest {
            date: Some(date.clone()),
            period_days,
        })
        .await?;

    if json {
        return print_json(&resp);
    }
    eprintln!("{}", resp.message);

    let insights = client.get_ai_insights(Some(&date)).await?;
    let latest = resp
        .insight_id
        .as_deref()
        .and_then(|id| insights.iter().find(|i| i.insight_id == id))
        .or_else(|| insights.last());
    if let Some(insight) = latest {
        print_insight(insight);
    }
    Ok(())
}
