/// Database row types — these map directly to SQLite rows.
/// Distinct from the homefinder-types API models to keep the DB layer
/// independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct PropertyRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub property_type: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub property_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}

/// One side of a message, as joined from the users table. The password
/// column is deliberately never selected here.
pub struct PartyRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

/// A message joined with both parties and the property it concerns, fetched
/// in a single query.
pub struct MessageDetailRow {
    pub message: MessageRow,
    pub sender: PartyRow,
    pub receiver: PartyRow,
    pub property: PropertyRow,
}

/// Search filters for the property catalog. `None` imposes no constraint.
#[derive(Debug, Default)]
pub struct PropertyFilter {
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

/// Partial property update — only `Some` fields are written.
#[derive(Debug, Default)]
pub struct PropertyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub image_url: Option<String>,
}
