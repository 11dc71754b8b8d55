mod client;
mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::client::ClientError;
use crate::commands::{
    FoodFields, WellnessFields, cmd_dashboard, cmd_food_add, cmd_food_delete, cmd_food_list,
    cmd_food_search, cmd_food_update, cmd_insights_generate, cmd_insights_show, cmd_log,
    cmd_login, cmd_logout, cmd_meals, cmd_settings_auto_goals, cmd_settings_set,
    cmd_settings_show, cmd_wellness_log, cmd_whoami,
};
use crate::config::Config;
use fourm_core::workbook::Workbooks;

#[derive(Parser)]
#[command(
    name = "fourm",
    version,
    about = "4M nutrition tracker: macros, micros, meals and wellness",
    long_about = "\n\n  ██╗  ██╗███╗   ███╗
  ██║  ██║████╗ ████║
  ███████║██╔████╔██║
  ╚════██║██║╚██╔╝██║
       ██║██║ ╚═╝ ██║
       ╚═╝╚═╝     ╚═╝
  macros, micros, meals, mind.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with your email
    Login {
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the saved session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show who is signed in
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Daily dashboard: macro progress, calorie split, quick stats and meals
    Dashboard {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse and edit the food database
    Foods {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log a meal by searching the food database
    Log {
        /// Food name to search for
        food: String,
        /// Amount eaten (e.g. "150", "150g", "2 tbsp"; default unit is the food's serving unit)
        amount: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals for a day
    Meals {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// View and change goals, profile and preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Track sleep, weight, mood, activity and hydration
    Wellness {
        #[command(subcommand)]
        command: WellnessCommands,
    },
    /// Nutrition reviews and correlations
    Insights {
        #[command(subcommand)]
        command: InsightsCommands,
    },
    /// Start the action API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Keep workbooks in memory (nothing is written to disk)
        #[arg(long)]
        in_memory: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List foods
    List {
        /// Only foods in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only verified foods
        #[arg(long)]
        verified: bool,
        /// Maximum number of foods (default: 100)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search foods by name
    Search {
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food
    Add {
        /// Food name
        name: String,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a food's columns
    Update {
        /// Food ID (e.g. F001)
        food_id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Mark as verified or not
        #[arg(long)]
        verified: Option<bool>,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food by ID
    Delete {
        /// Food ID (e.g. F001)
        food_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show all settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set one or more settings (e.g. `calorie_goal=2200 activity_level=active`)
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        pairs: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute goals from weight, height, age and activity level, then save them
    AutoGoals {
        /// Show the goals without saving
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WellnessCommands {
    /// Log wellness data for a day
    Log {
        #[command(flatten)]
        fields: WellnessFields,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum InsightsCommands {
    /// Show insights for a day, plus recorded correlations
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Review the day against your goals
    Generate {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Days to look back for trends (default: 7, max: 90)
        #[arg(long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let result = dispatch(cli.command, &config).await;

    if let Err(e) = &result {
        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::Unauthorized)) {
            config.clear_session()?;
        }
    }
    result
}

async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login { email, json } => cmd_login(config, &email, json).await,
        Commands::Logout { json } => cmd_logout(config, json),
        Commands::Whoami { json } => cmd_whoami(config, json),
        Commands::Dashboard { date, json } => cmd_dashboard(config, date.as_deref(), json).await,
        Commands::Foods { command } => match command {
            FoodCommands::List {
                category,
                verified,
                limit,
                json,
            } => cmd_food_list(config, category.as_deref(), verified, limit, json).await,
            FoodCommands::Search { query, json } => cmd_food_search(config, &query, json).await,
            FoodCommands::Add { name, fields, json } => {
                cmd_food_add(config, &name, &fields, json).await
            }
            FoodCommands::Update {
                food_id,
                name,
                verified,
                fields,
                json,
            } => cmd_food_update(config, &food_id, name, verified, &fields, json).await,
            FoodCommands::Delete { food_id, json } => {
                cmd_food_delete(config, &food_id, json).await
            }
        },
        Commands::Log {
            food,
            amount,
            meal,
            date,
            notes,
            json,
        } => cmd_log(config, &food, &amount, &meal, date.as_deref(), notes, json).await,
        Commands::Meals { date, json } => cmd_meals(config, date.as_deref(), json).await,
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(config, json).await,
            SettingsCommands::Set { pairs, json } => cmd_settings_set(config, &pairs, json).await,
            SettingsCommands::AutoGoals { dry_run, json } => {
                cmd_settings_auto_goals(config, dry_run, json).await
            }
        },
        Commands::Wellness { command } => match command {
            WellnessCommands::Log { fields, date, json } => {
                cmd_wellness_log(config, fields, date.as_deref(), json).await
            }
        },
        Commands::Insights { command } => match command {
            InsightsCommands::Show { date, json } => {
                cmd_insights_show(config, date.as_deref(), json).await
            }
            InsightsCommands::Generate { date, days, json } => {
                cmd_insights_generate(config, date.as_deref(), days, json).await
            }
        },
        Commands::Serve {
            port,
            bind,
            in_memory,
        } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("fourm=info,tower_http=info")),
                )
                .init();
            let workbooks = if in_memory {
                Workbooks::in_memory()
            } else {
                Workbooks::on_disk(&config.workbook_dir)?
            };
            server::start_server(workbooks, port, &bind, &config.allowed_origins).await
        }
    }
}
