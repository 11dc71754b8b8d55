mod dashboard;
mod foods;
mod helpers;
mod insights;
mod log;
mod session;
mod settings;
mod wellness;

use anyhow::{Result, bail};

use crate::client::ApiClient;
use crate::config::Config;
use fourm_core::models::Food;

use helpers::{print_food_table, prompt_choice};

pub(crate) use dashboard::cmd_dashboard;
pub(crate) use foods::{
    FoodFields, cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_search, cmd_food_update,
};
pub(crate) use insights::{cmd_insights_generate, cmd_insights_show};
pub(crate) use log::{cmd_log, cmd_meals};
pub(crate) use session::{cmd_login, cmd_logout, cmd_whoami};
pub(crate) use settings::{cmd_settings_auto_goals, cmd_settings_set, cmd_settings_show};
pub(crate) use wellness::{WellnessFields, cmd_wellness_log};

/// Client for the saved session. Every page except `login` and `serve` goes through here.
pub(crate) fn api(config: &Config) -> Result<ApiClient> {
    let session = config.require_session()?;
    ApiClient::new(&config.api_url, &session.token)
}

/// Resolve a food name to one record, prompting when the search is ambiguous.
pub(super) async fn resolve_food(client: &ApiClient, food_query: &str) -> Result<Food> {
    let mut found = client.search_foods(food_query).await?;
    match found.len() {
        0 => bail!("No food found for '{food_query}'"),
        1 => Ok(found.swap_remove(0)),
        n => {
            print_food_table(&found);
            let idx = prompt_choice(n)?;
            Ok(found.swap_remove(idx))
        }
    }
}
