use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant boundary. Every other record belongs to exactly one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,

    /// Random alphanumeric secret generated once at creation.
    pub private_key: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One tracked individual within an organization.
///
/// Demographic fields describe the latest observation, not identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub organization_id: String,

    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Embedding from the recognition pipeline.
    #[serde(default)]
    pub vector: Option<Vec<f32>>,

    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,

    /// Set when this record was created from an ambiguous (`review`) match:
    /// the id of the candidate it may duplicate.
    #[serde(default)]
    pub review_of: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Person without the embedding, for listings and detail views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummary {
    pub id: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub body_type: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub review_of: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Person> for PersonSummary {
    fn from(p: &Person) -> Self {
        Self {
            id: p.id.clone(),
            full_name: p.full_name.clone(),
            phone_number: p.phone_number.clone(),
            age: p.age,
            gender: p.gender.clone(),
            emotion: p.emotion.clone(),
            body_type: p.body_type.clone(),
            entry_time: p.entry_time,
            exit_time: p.exit_time,
            review_of: p.review_of.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One visit's order, owned by a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub organization_id: String,
    pub person_id: String,
    #[serde(default)]
    pub table_number: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link between a cart and a product. At most one per (cart, product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: String,
    pub organization_id: String,
    pub cart_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub added_at: DateTime<Utc>,
}

/// A cart with its products, as shown in order history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub cart_id: String,
    pub cart_created_at: DateTime<Utc>,
    pub cart_updated_at: DateTime<Utc>,
    pub table_number: Option<i32>,
    pub products: Vec<OrderLine>,
    pub total_products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderHistory {
    pub person_id: String,
    pub person_name: Option<String>,
    pub total_orders: usize,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishCount {
    pub dish: String,
    pub count: usize,
}

/// Visit statistics for one person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSummary {
    pub person_id: String,
    pub person_name: Option<String>,
    pub total_visits: usize,
    pub last_visit: Option<DateTime<Utc>>,
    /// Most used table; ties go to the most recent visit.
    pub favorite_table: Option<i32>,
    /// Up to five most ordered products by name.
    pub favorite_dishes: Vec<DishCount>,
    pub total_spent_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDetail {
    #[serde(flatten)]
    pub person: PersonSummary,
    pub carts: Vec<Order>,
}

/// One page of a person listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonPage {
    pub count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
    pub results: Vec<PersonSummary>,
}
