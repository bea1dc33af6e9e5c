use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::ProductError;

/// Product entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Assigned by storage, never changes
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Widget")]
    pub name: String,
    #[schema(example = "A very useful widget")]
    pub description: Option<String>,
    #[schema(example = 9.99)]
    pub price: f64,
    #[schema(example = "Tools")]
    pub category: String,
    /// Public path of the uploaded image
    #[schema(example = "/images/products/0192f1c4-6b5e-7c1a-9d0e-3f4a5b6c7d8e.jpg")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: i64, input: ProductInput) -> Self {
        let now = now();
        Self {
            id,
            name: input.name,
            description: input.description.flatten(),
            price: input.price,
            category: input.category,
            image: input.image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the supplied fields and advance `updated_at`.
    ///
    /// `id` and `created_at` are left alone; `image` only changes when a new
    /// one was stored.
    pub fn apply_update(&mut self, input: ProductInput) {
        self.name = input.name;
        self.price = input.price;
        self.category = input.category;
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(image) = input.image {
            self.image = Some(image);
        }
        self.updated_at = next_timestamp(self.updated_at);
    }
}

/// Current time at the precision PostgreSQL stores
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly after `previous`, normally just [`now`].
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

/// Validated field set handed to storage
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    /// `None` when the field was not sent at all; `Some(None)` clears it
    pub description: Option<Option<String>>,
    pub price: f64,
    pub category: String,
    /// Public image path, set only when an upload was stored
    pub image: Option<String>,
}

impl ProductInput {
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

/// Create/update form fields.
///
/// Each field keeps the raw value it arrived with, so a wrong type is
/// reported by validation under that field's own key instead of failing
/// deserialization for the whole body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(
        required(message = "The name field is required."),
        custom(function = "validate_name")
    )]
    pub name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(custom(function = "validate_description"))]
    pub description: Option<Option<Value>>,

    #[validate(
        required(message = "The price field is required."),
        custom(function = "validate_price")
    )]
    pub price: Option<Value>,

    #[validate(
        required(message = "The category field is required."),
        custom(function = "validate_category")
    )]
    pub category: Option<Value>,
}

const MAX_TEXT_CHARS: usize = 255;

fn short_text(field: &str, value: &Value) -> Result<(), ValidationError> {
    let Some(text) = value.as_str() else {
        return Err(ValidationError::new("string")
            .with_message(format!("The {} field must be a string.", field).into()));
    };

    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::new("max").with_message(
            format!("The {} field must not be greater than {} characters.", field, MAX_TEXT_CHARS).into(),
        ));
    }
    Ok(())
}

fn validate_name(value: &Value) -> Result<(), ValidationError> {
    short_text("name", value)
}

fn validate_category(value: &Value) -> Result<(), ValidationError> {
    short_text("category", value)
}

fn validate_description(value: &Value) -> Result<(), ValidationError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(ValidationError::new("string").with_message("The description field must be a string.".into()))
    }
}

/// JSON clients send `9.99`, forms send `"9.99"`; both are accepted
fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }?;
    price.is_finite().then_some(price)
}

fn validate_price(value: &Value) -> Result<(), ValidationError> {
    match parse_price(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("numeric").with_message("The price field must be a number.".into())),
    }
}

/// Distinguishes an explicit `null` from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

impl TryFrom<ProductForm> for ProductInput {
    type Error = ProductError;

    fn try_from(form: ProductForm) -> Result<Self, Self::Error> {
        let invalid = |field: &str| ProductError::Validation(format!("The {} field is invalid.", field));
        let into_text = |value: Option<Value>, field: &str| match value {
            Some(Value::String(text)) => Ok(text),
            _ => Err(invalid(field)),
        };

        let price = form
            .price
            .as_ref()
            .and_then(parse_price)
            .ok_or_else(|| invalid("price"))?;

        let description = match form.description {
            None => None,
            Some(None) => Some(None),
            Some(value) => Some(Some(into_text(value, "description")?)),
        };

        Ok(Self {
            name: into_text(form.name, "name")?,
            description,
            price,
            category: into_text(form.category, "category")?,
            image: None,
        })
    }
}

/// Multipart body accepted by create and update (documentation only)
#[derive(Deserialize, ToSchema)]
pub struct ProductUpload {
    #[schema(example = "Widget")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 9.99)]
    pub price: f64,
    #[schema(example = "Tools")]
    pub category: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    /// `PUT` when an update is sent as `POST`
    #[serde(rename = "_method")]
    #[schema(example = "PUT")]
    pub method: Option<String>,
}

/// `{ "message": ..., "data": Product }` returned by create and update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductEnvelope {
    #[schema(example = "Product created successfully")]
    pub message: String,
    pub data: Product,
}

impl ProductEnvelope {
    pub fn created(data: Product) -> Self {
        Self {
            message: "Product created successfully".to_string(),
            data,
        }
    }

    pub fn updated(data: Product) -> Self {
        Self {
            message: "Product updated successfully".to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    #[schema(example = "Product deleted successfully")]
    pub message: String,
}

impl Default for DeletedResponse {
    fn default() -> Self {
        Self {
            message: "Product deleted successfully".to_string(),
        }
    }
}
