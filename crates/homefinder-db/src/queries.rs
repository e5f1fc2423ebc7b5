use crate::Database;
use crate::models::{
    MessageDetailRow, MessageRow, PartyRow, PropertyFilter, PropertyPatch, PropertyRow, UserRow,
};
use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::Value;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, full_name, email, password, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (username, full_name, email, password_hash, role),
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE email = ?1"))?;
            let row = stmt.query_row([email], map_user_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE username = ?1"))?;
            let row = stmt.query_row([username], map_user_row).optional()?;
            Ok(row)
        })
    }

    /// Profile update: fullName and email only, bumps updated_at.
    pub fn update_user(&self, id: i64, full_name: &str, email: &str) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET full_name = ?1, email = ?2, updated_at = datetime('now')
                 WHERE id = ?3",
                (full_name, email, id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    // -- Properties --

    pub fn create_property(
        &self,
        owner_id: i64,
        name: &str,
        description: &str,
        price: i64,
        location: &str,
        property_type: &str,
        image_url: Option<&str>,
    ) -> Result<PropertyRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO properties (owner_id, name, description, price, location, type, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (owner_id, name, description, price, location, property_type, image_url),
            )?;
            let id = conn.last_insert_rowid();
            query_property_by_id(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("property {} vanished after insert", id))
        })
    }

    pub fn get_property(&self, id: i64) -> Result<Option<PropertyRow>> {
        self.with_conn(|conn| query_property_by_id(conn, id))
    }

    pub fn get_properties_by_owner(&self, owner_id: i64) -> Result<Vec<PropertyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{PROPERTY_SELECT} WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([owner_id], map_property_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Filtered catalog search. Blank location, `type=all` and non-positive
    /// price bounds impose no constraint; no filters returns everything
    /// newest-first.
    pub fn search_properties(&self, filter: &PropertyFilter) -> Result<Vec<PropertyRow>> {
        self.with_conn(|conn| {
            let mut conditions: Vec<String> = Vec::new();
            let mut params: Vec<Value> = Vec::new();

            if let Some(location) = filter.location.as_deref()
                && !location.trim().is_empty()
            {
                params.push(Value::Text(format!("%{}%", location)));
                conditions.push(format!("location LIKE ?{}", params.len()));
            }

            if let Some(ptype) = filter.property_type.as_deref()
                && ptype != "all"
            {
                params.push(Value::Text(ptype.to_string()));
                conditions.push(format!("type = ?{}", params.len()));
            }

            if let Some(min) = filter.min_price
                && min > 0
            {
                params.push(Value::Integer(min));
                conditions.push(format!("price >= ?{}", params.len()));
            }

            if let Some(max) = filter.max_price
                && max > 0
            {
                params.push(Value::Integer(max));
                conditions.push(format!("price <= ?{}", params.len()));
            }

            let where_clause = if conditions.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", conditions.join(" AND "))
            };

            let sql = format!(
                "{PROPERTY_SELECT}{where_clause} ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), map_property_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ownership-scoped partial update. Returns None when the property does
    /// not exist or belongs to someone else.
    pub fn update_property(
        &self,
        id: i64,
        owner_id: i64,
        patch: &PropertyPatch,
    ) -> Result<Option<PropertyRow>> {
        self.with_conn_mut(|conn| {
            let Some(current) = query_property_owned(conn, id, owner_id)? else {
                return Ok(None);
            };

            let name = patch.name.as_deref().unwrap_or(&current.name);
            let description = patch
                .description
                .as_deref()
                .unwrap_or(&current.description);
            let price = patch.price.unwrap_or(current.price);
            let location = patch.location.as_deref().unwrap_or(&current.location);
            let property_type = patch
                .property_type
                .as_deref()
                .unwrap_or(&current.property_type);
            let image_url = patch
                .image_url
                .as_deref()
                .or(current.image_url.as_deref());

            conn.execute(
                "UPDATE properties
                 SET name = ?1, description = ?2, price = ?3, location = ?4,
                     type = ?5, image_url = ?6, updated_at = datetime('now')
                 WHERE id = ?7",
                (name, description, price, location, property_type, image_url, id),
            )?;

            query_property_by_id(conn, id)
        })
    }

    /// Ownership-scoped delete. Messages about the property are removed
    /// first — the cascade lives at the application layer, not the schema.
    pub fn delete_property(&self, id: i64, owner_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_property_owned(&tx, id, owner_id)?.is_none() {
                return Ok(false);
            }

            tx.execute("DELETE FROM messages WHERE property_id = ?1", [id])?;
            tx.execute("DELETE FROM properties WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(true)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        property_id: i64,
        content: &str,
    ) -> Result<MessageDetailRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, property_id, content)
                 VALUES (?1, ?2, ?3, ?4)",
                (sender_id, receiver_id, property_id, content),
            )?;
            let id = conn.last_insert_rowid();

            let mut stmt = conn.prepare(&format!("{DETAIL_SELECT} WHERE m.id = ?1"))?;
            let row = stmt.query_row([id], map_detail_row).optional()?;
            row.ok_or_else(|| anyhow::anyhow!("message {} vanished after insert", id))
        })
    }

    /// All messages where the user is sender or receiver, newest first.
    /// The id tiebreaker keeps same-second inserts in insertion order.
    pub fn get_messages_for_user(&self, user_id: i64) -> Result<Vec<MessageDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DETAIL_SELECT}
                 WHERE m.sender_id = ?1 OR m.receiver_id = ?1
                 ORDER BY m.created_at DESC, m.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_detail_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The thread between two users about one property, chronological order
    /// (oldest first — opposite of the conversation list).
    pub fn get_conversation(
        &self,
        user_id: i64,
        other_user_id: i64,
        property_id: i64,
    ) -> Result<Vec<MessageDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DETAIL_SELECT}
                 WHERE m.property_id = ?3
                   AND ((m.sender_id = ?1 AND m.receiver_id = ?2)
                     OR (m.sender_id = ?2 AND m.receiver_id = ?1))
                 ORDER BY m.created_at ASC, m.id ASC"
            ))?;
            let rows = stmt
                .query_map([user_id, other_user_id, property_id], map_detail_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Directional: flips unread messages *from* sender *to* receiver.
    /// Idempotent — a second call matches zero rows.
    pub fn mark_messages_read(&self, sender_id: i64, receiver_id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET read = 1
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND read = 0",
                (sender_id, receiver_id),
            )?;
            Ok(changed)
        })
    }

    pub fn get_unread_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Hard-deletes the whole thread for both participants. Zero matched
    /// rows is still success.
    pub fn delete_conversation(
        &self,
        user_id: i64,
        other_user_id: i64,
        property_id: i64,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM messages
                 WHERE property_id = ?3
                   AND ((sender_id = ?1 AND receiver_id = ?2)
                     OR (sender_id = ?2 AND receiver_id = ?1))",
                (user_id, other_user_id, property_id),
            )?;
            Ok(deleted)
        })
    }
}

const USER_SELECT: &str =
    "SELECT id, username, full_name, email, password, role, created_at, updated_at FROM users";

const PROPERTY_SELECT: &str = "SELECT id, owner_id, name, description, price, location, type, \
     image_url, created_at, updated_at FROM properties";

// JOIN both parties and the property in one query (eliminates N+1).
const DETAIL_SELECT: &str = "SELECT m.id, m.sender_id, m.receiver_id, m.property_id, m.content, m.read, m.created_at,
            su.id, su.username, su.full_name, su.email, su.role,
            ru.id, ru.username, ru.full_name, ru.email, ru.role,
            p.id, p.owner_id, p.name, p.description, p.price, p.location, p.type,
            p.image_url, p.created_at, p.updated_at
     FROM messages m
     JOIN users su ON m.sender_id = su.id
     JOIN users ru ON m.receiver_id = ru.id
     JOIN properties p ON m.property_id = p.id";

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn map_property_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PropertyRow> {
    Ok(PropertyRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        location: row.get(5)?,
        property_type: row.get(6)?,
        image_url: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_detail_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageDetailRow> {
    Ok(MessageDetailRow {
        message: MessageRow {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            receiver_id: row.get(2)?,
            property_id: row.get(3)?,
            content: row.get(4)?,
            read: row.get(5)?,
            created_at: row.get(6)?,
        },
        sender: PartyRow {
            id: row.get(7)?,
            username: row.get(8)?,
            full_name: row.get(9)?,
            email: row.get(10)?,
            role: row.get(11)?,
        },
        receiver: PartyRow {
            id: row.get(12)?,
            username: row.get(13)?,
            full_name: row.get(14)?,
            email: row.get(15)?,
            role: row.get(16)?,
        },
        property: PropertyRow {
            id: row.get(17)?,
            owner_id: row.get(18)?,
            name: row.get(19)?,
            description: row.get(20)?,
            price: row.get(21)?,
            location: row.get(22)?,
            property_type: row.get(23)?,
            image_url: row.get(24)?,
            created_at: row.get(25)?,
            updated_at: row.get(26)?,
        },
    })
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE id = ?1"))?;
    let row = stmt.query_row([id], map_user_row).optional()?;
    Ok(row)
}

fn query_property_by_id(conn: &Connection, id: i64) -> Result<Option<PropertyRow>> {
    let mut stmt = conn.prepare(&format!("{PROPERTY_SELECT} WHERE id = ?1"))?;
    let row = stmt.query_row([id], map_property_row).optional()?;
    Ok(row)
}

fn query_property_owned(
    conn: &Connection,
    id: i64,
    owner_id: i64,
) -> Result<Option<PropertyRow>> {
    let mut stmt = conn.prepare(&format!(
        "{PROPERTY_SELECT} WHERE id = ?1 AND owner_id = ?2"
    ))?;
    let row = stmt
        .query_row([id, owner_id], map_property_row)
        .optional()?;
    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
