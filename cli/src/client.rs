use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use fourm_core::models::{
    ActionResponse, Correlation, DailyStats, Food, FoodPatch, Insight, Meal, NewFood,
    NewInsightRequest, NewMeal, WellnessEntry,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Session expired or invalid. Run `fourm login <email>` again")]
    Unauthorized,
    #[error("{action} failed ({status}): {message}")]
    Status {
        action: String,
        status: StatusCode,
        message: String,
    },
    #[error("Failed to reach the 4M server at {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to parse {action} response")]
    Decode {
        action: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Deserialize)]
struct FoodsResponse {
    foods: Vec<Food>,
}

#[derive(Deserialize)]
struct MealsResponse {
    meals: Vec<Meal>,
}

#[derive(Deserialize)]
struct InsightsResponse {
    insights: Vec<Insight>,
}

#[derive(Deserialize)]
struct CorrelationsResponse {
    correlations: Vec<Correlation>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the action API. Every call carries the session token as `?token=`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("fourm/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("action", action), ("token", self.token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: self.base_url.clone(),
                source,
            })?;
        Self::decode(action, resp).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .client
            .post(&self.base_url)
            .query(&[("action", action), ("token", self.token.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: self.base_url.clone(),
                source,
            })?;
        Self::decode(action, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        action: &str,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map_or_else(|_| status.to_string(), |body| body.error);
            return Err(ClientError::Status {
                action: action.to_string(),
                status,
                message,
            });
        }
        resp.json().await.map_err(|source| ClientError::Decode {
            action: action.to_string(),
            source,
        })
    }

    // --- Reads ---

    pub async fn get_daily_stats(&self, date: Option<&str>) -> Result<DailyStats, ClientError> {
        self.get("getDailyStats", &date_param(date)).await
    }

    pub async fn get_food_database(
        &self,
        category: Option<&str>,
        verified: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Food>, ClientError> {
        let mut params = Vec::new();
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        if verified {
            params.push(("verified", "true".to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        let resp: FoodsResponse = self.get("getFoodDatabase", &params).await?;
        Ok(resp.foods)
    }

    pub async fn get_meals(&self, date: Option<&str>) -> Result<Vec<Meal>, ClientError> {
        let resp: MealsResponse = self.get("getMeals", &date_param(date)).await?;
        Ok(resp.meals)
    }

    pub async fn search_foods(&self, query: &str) -> Result<Vec<Food>, ClientError> {
        let resp: FoodsResponse = self
            .get("searchFoods", &[("query", query.to_string())])
            .await?;
        Ok(resp.foods)
    }

    pub async fn get_user_settings(&self) -> Result<Map<String, Value>, ClientError> {
        self.get("getUserSettings", &[]).await
    }

    pub async fn get_ai_insights(&self, date: Option<&str>) -> Result<Vec<Insight>, ClientError> {
        let resp: InsightsResponse = self.get("getAIInsights", &date_param(date)).await?;
        Ok(resp.insights)
    }

    pub async fn get_correlations(&self) -> Result<Vec<Correlation>, ClientError> {
        let resp: CorrelationsResponse = self.get("getCorrelations", &[]).await?;
        Ok(resp.correlations)
    }

    // --- Writes ---

    pub async fn log_meal(&self, meal: &NewMeal) -> Result<ActionResponse, ClientError> {
        self.post("logMeal", meal).await
    }

    pub async fn add_food(&self, food: &NewFood) -> Result<ActionResponse, ClientError> {
        self.post("addFood", food).await
    }

    pub async fn update_food(&self, patch: &FoodPatch) -> Result<ActionResponse, ClientError> {
        self.post("updateFood", patch).await
    }

    pub async fn delete_food(&self, food_id: &str) -> Result<ActionResponse, ClientError> {
        self.post("deleteFood", &serde_json::json!({ "food_id": food_id }))
            .await
    }

    pub async fn update_user_settings(
        &self,
        settings: &Map<String, Value>,
    ) -> Result<ActionResponse, ClientError> {
        self.post("updateUserSettings", settings).await
    }

    pub async fn log_wellness(&self, entry: &WellnessEntry) -> Result<ActionResponse, ClientError> {
        self.post("logWellness", entry).await
    }

    pub async fn generate_ai_insight(
        &self,
        request: &NewInsightRequest,
    ) -> Result<ActionResponse, ClientError> {
        self.post("generateAIInsight", request).await
    }
}

fn date_param(date: Option<&str>) -> Vec<(&'static str, String)> {
    date.map(|d| vec![("date", d.to_string())])
        .unwrap_or_default()
}
