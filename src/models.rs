//! Catalog records and request payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{PrincipalId, RoleCode};
use crate::validation::{is_plausible_email, FieldError, Validate, Violations};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_minutes: u32,
    pub servings: u32,
    pub author_id: PrincipalId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_minutes: u32,
    pub servings: u32,
}

impl Validate for NewRecipe {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.length(&self.title, "title", 3, 120)
            .check(!self.ingredients.is_empty(), "ingredients", "at least one ingredient is required")
            .check(!self.instructions.is_empty(), "instructions", "at least one step is required")
            .check(self.prep_minutes <= 1440, "prepMinutes", "must be at most 1440")
            .check((1..=100).contains(&self.servings), "servings", "must be between 1 and 100");
        for (i, ingredient) in self.ingredients.iter().enumerate() {
            v.check(
                !ingredient.name.trim().is_empty(),
                format!("ingredients[{i}].name"),
                "must not be empty",
            )
            .check(
                ingredient.quantity > 0.0,
                format!("ingredients[{i}].quantity"),
                "must be greater than 0",
            );
        }
        for (i, step) in self.instructions.iter().enumerate() {
            v.check(!step.trim().is_empty(), format!("instructions[{i}]"), "must not be empty");
        }
        v.finish()
    }
}

impl NewRecipe {
    pub fn into_recipe(self, author_id: PrincipalId) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            ingredients: self.ingredients,
            instructions: self.instructions,
            prep_minutes: self.prep_minutes,
            servings: self.servings,
            author_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: u64,
    pub unit: String,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: u64,
    pub unit: String,
    #[serde(default)]
    pub stock: u32,
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.length(&self.name, "name", 1, 120)
            .check(self.price_cents > 0, "priceCents", "must be greater than 0")
            .length(&self.unit, "unit", 1, 20);
        v.finish()
    }
}

impl NewProduct {
    pub fn into_product(self) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            price_cents: self.price_cents,
            unit: self.unit.trim().to_string(),
            stock: self.stock,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub id: Uuid,
    pub owner_id: PrincipalId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expires_on: Option<NaiveDate>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPantryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
}

impl Validate for NewPantryItem {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.length(&self.name, "name", 1, 120)
            .check(self.quantity > 0.0, "quantity", "must be greater than 0")
            .length(&self.unit, "unit", 1, 20);
        v.finish()
    }
}

impl NewPantryItem {
    pub fn into_item(self, owner_id: PrincipalId) -> PantryItem {
        PantryItem {
            id: Uuid::new_v4(),
            owner_id,
            name: self.name.trim().to_string(),
            quantity: self.quantity,
            unit: self.unit.trim().to_string(),
            expires_on: self.expires_on,
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.length(&self.name, "name", 1, 80)
            .check(is_plausible_email(self.email.trim()), "email", "must be a valid email address");
        v.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    pub role: RoleCode,
}
