//! Ingredient catalog and recipe generation through an OpenAI compatible
//! chat completion endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{config::OpenAiConfig, error::RecipeError};

const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Fruits,
    Vegetables,
    Protein,
    Carbs,
    #[serde(rename = "Herbs & Spices")]
    HerbsAndSpices,
    Dairy,
    Oils,
    Seasoning,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Fruits,
        Self::Vegetables,
        Self::Protein,
        Self::Carbs,
        Self::HerbsAndSpices,
        Self::Dairy,
        Self::Oils,
        Self::Seasoning,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fruits => "Fruits",
            Self::Vegetables => "Vegetables",
            Self::Protein => "Protein",
            Self::Carbs => "Carbs",
            Self::HerbsAndSpices => "Herbs & Spices",
            Self::Dairy => "Dairy",
            Self::Oils => "Oils",
            Self::Seasoning => "Seasoning",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub id: u32,
    pub name: &'static str,
    pub category: Category,
}

macro_rules! catalog {
    ($($id:literal $name:literal $category:ident),* $(,)?) => {
        &[$(Ingredient { id: $id, name: $name, category: Category::$category }),*]
    };
}

pub const INGREDIENTS: &[Ingredient] = catalog![
    1 "Apple" Fruits,
    2 "Banana" Fruits,
    3 "Orange" Fruits,
    4 "Strawberries" Fruits,
    5 "Grapes" Fruits,
    6 "Broccoli" Vegetables,
    7 "Carrots" Vegetables,
    8 "Spinach" Vegetables,
    9 "Bell Peppers" Vegetables,
    10 "Onions" Vegetables,
    11 "Chicken" Protein,
    12 "Beef" Protein,
    13 "Tofu" Protein,
    14 "Eggs" Protein,
    15 "Salmon" Protein,
    16 "Rice" Carbs,
    17 "Pasta" Carbs,
    18 "Bread" Carbs,
    19 "Quinoa" Carbs,
    20 "Potatoes" Carbs,
    21 "Basil" HerbsAndSpices,
    22 "Oregano" HerbsAndSpices,
    23 "Garlic" HerbsAndSpices,
    24 "Ginger" HerbsAndSpices,
    25 "Chili Powder" HerbsAndSpices,
    26 "Milk" Dairy,
    27 "Cheese" Dairy,
    28 "Yogurt" Dairy,
    29 "Butter" Dairy,
    30 "Cream" Dairy,
    31 "Avocado Oil" Oils,
    32 "Vegetable Oil" Oils,
    33 "Olive Oil" Oils,
    34 "Mustard Oil" Oils,
    35 "Salt" Seasoning,
    36 "Black Pepper" Seasoning,
    37 "Garlic Powder" Seasoning,
    38 "Onion Powder" Seasoning,
    39 "Paprika" Seasoning,
    40 "Cumin" Seasoning,
    41 "Turmeric" Seasoning,
];

/// Catalog entries of `category`, or the whole catalog for `None`.
pub fn ingredients_in(category: Option<Category>) -> Vec<&'static Ingredient> {
    INGREDIENTS
        .iter()
        .filter(|ingredient| category.map_or(true, |c| ingredient.category == c))
        .collect()
}

/// Ingredients picked by the user, in the order they were picked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngredientSelection(Vec<String>);

impl IngredientSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` if it is not selected yet, remove it otherwise. Returns
    /// whether it is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        match self.0.iter().position(|picked| picked == name) {
            Some(index) => {
                self.0.remove(index);
                false
            }
            None => {
                self.0.push(name.to_string());
                true
            }
        }
    }

    /// Add `name` unless it is already selected.
    pub fn select(&mut self, name: &str) {
        if !self.0.iter().any(|picked| picked == name) {
            self.0.push(name.to_string());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for IngredientSelection {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        let mut selection = Self::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                selection.select(name);
            }
        }
        selection
    }
}

pub fn recipe_prompt<S: AsRef<str>>(ingredients: &[S]) -> String {
    let list = ingredients
        .iter()
        .map(|ingredient| ingredient.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Create a recipe using the following ingredients: {list}. \
         Please include a title, ingredients list, and instructions."
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Client for the hosted completion API. One request per recipe, no retry.
#[derive(Clone)]
pub struct RecipeClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl RecipeClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, RecipeError> {
        let api_key = config.api_key.clone().ok_or(RecipeError::MissingApiKey)?;
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate<S: AsRef<str>>(&self, ingredients: &[S]) -> Result<String, RecipeError> {
        if ingredients.is_empty() {
            return Err(RecipeError::NoIngredients);
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(recipe_prompt(ingredients)),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("requesting recipe from {url} with {} ingredients", ingredients.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!("recipe service error: {status} - {body}");
            return Err(RecipeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RecipeError::EmptyResponse)
    }
}
