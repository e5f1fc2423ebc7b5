//! Row-to-API-model conversions. SQLite hands back text timestamps and
//! stringly-typed enums; corrupt values are logged and defaulted rather than
//! failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;

use homefinder_db::models::{MessageDetailRow, PartyRow, PropertyRow, UserRow};
use homefinder_types::models::{Message, Property, PropertyType, Role, User};

pub fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

fn parse_role(raw: &str, context: &str) -> Role {
    Role::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt role '{}' on {}", raw, context);
        Role::Tenant
    })
}

fn parse_property_type(raw: &str, context: &str) -> PropertyType {
    PropertyType::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt property type '{}' on {}", raw, context);
        PropertyType::Apartment
    })
}

pub fn user_from_row(row: &UserRow) -> User {
    User {
        id: row.id,
        username: row.username.clone(),
        full_name: row.full_name.clone(),
        email: row.email.clone(),
        role: parse_role(&row.role, &format!("user {}", row.id)),
    }
}

pub fn user_from_party(row: &PartyRow) -> User {
    User {
        id: row.id,
        username: row.username.clone(),
        full_name: row.full_name.clone(),
        email: row.email.clone(),
        role: parse_role(&row.role, &format!("user {}", row.id)),
    }
}

pub fn property_from_row(row: &PropertyRow) -> Property {
    let context = format!("property {}", row.id);
    Property {
        id: row.id,
        owner_id: row.owner_id,
        name: row.name.clone(),
        description: row.description.clone(),
        price: row.price,
        location: row.location.clone(),
        property_type: parse_property_type(&row.property_type, &context),
        image_url: row.image_url.clone(),
        created_at: parse_timestamp(&row.created_at, &context),
        updated_at: parse_timestamp(&row.updated_at, &context),
    }
}

pub fn message_from_detail(row: &MessageDetailRow) -> Message {
    Message {
        id: row.message.id,
        sender_id: row.message.sender_id,
        receiver_id: row.message.receiver_id,
        property_id: row.message.property_id,
        content: row.message.content.clone(),
        read: row.message.read,
        created_at: parse_timestamp(
            &row.message.created_at,
            &format!("message {}", row.message.id),
        ),
        sender: user_from_party(&row.sender),
        receiver: user_from_party(&row.receiver),
        property: property_from_row(&row.property),
    }
}
