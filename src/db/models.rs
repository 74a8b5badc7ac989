use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub tel: String,
    pub address: String,
    pub opening_hours: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub view_count: i64,
    pub category_id: Option<i64>,
    pub created_at: String,
}

/// Public face of a user; credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
}

/// Column list matching [`Restaurant::from_row`], for a table aliased `r`.
pub const RESTAURANT_COLUMNS: &str = "r.id, r.name, r.tel, r.address, r.opening_hours, \
     r.description, r.image, r.view_count, r.category_id, r.created_at";

impl Restaurant {
    /// Reads the ten [`RESTAURANT_COLUMNS`] starting at `offset`.
    pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            tel: row.get(offset + 2)?,
            address: row.get(offset + 3)?,
            opening_hours: row.get(offset + 4)?,
            description: row.get(offset + 5)?,
            image: row.get(offset + 6)?,
            view_count: row.get(offset + 7)?,
            category_id: row.get(offset + 8)?,
            created_at: row.get(offset + 9)?,
        })
    }
}
