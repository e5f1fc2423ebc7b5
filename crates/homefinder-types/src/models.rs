use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User roles. `tenant` is the default; only `owner` may manage properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tenant,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Owner => "owner",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "tenant" => Some(Role::Tenant),
            "owner" => Some(Role::Owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Kost,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Kost => "kost",
        }
    }

    pub fn parse(s: &str) -> Option<PropertyType> {
        match s {
            "apartment" => Some(PropertyType::Apartment),
            "house" => Some(PropertyType::House),
            "kost" => Some(PropertyType::Kost),
            _ => None,
        }
    }
}

/// User as exposed over the API — never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message row with its sender, receiver and property expanded, as the
/// client consumes it. Content is immutable once created; only `read` flips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub property_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub sender: User,
    pub receiver: User,
    pub property: Property,
}

/// Derived view: messages between the viewer and one counterparty about one
/// property. Never persisted — computed from the flat message list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub user: User,
    pub property: Property,
    pub last_message: Message,
    pub unread_count: usize,
}
