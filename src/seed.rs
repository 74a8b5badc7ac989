// Demo data for an empty database: categories, users, restaurants, comments
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection};

use crate::state::DbPool;

const CATEGORIES: &[&str] = &[
    "Chinese",
    "Japanese",
    "Italian",
    "Mexican",
    "Vegetarian",
    "American",
    "Korean",
    "Thai",
];

/// (name, email, is_admin)
const USERS: &[(&str, &str, bool)] = &[
    ("root", "root@example.com", true),
    ("user1", "user1@example.com", false),
    ("user2", "user2@example.com", false),
];

pub const DEFAULT_PASSWORD: &str = "12345678";
pub const RESTAURANT_COUNT: usize = 50;
pub const COMMENT_COUNT: usize = 50;

const ADJECTIVES: &[&str] = &[
    "Golden", "Little", "Happy", "Red", "Hidden", "Old", "Blue", "Lucky", "Smoky", "Green",
];
const NOUNS: &[&str] = &[
    "Lantern", "Spoon", "Garden", "Kitchen", "Dragon", "Harbor", "Table", "Oven", "Bowl", "Fork",
];
const STREETS: &[&str] = &["Main St", "Oak Ave", "Harbor Rd", "Market St", "Hill Ln"];
const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "do", "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna",
    "aliqua", "enim", "minim", "veniam", "quis", "nostrud",
];

/// Rows inserted per table by one [`run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub users: usize,
    pub restaurants: usize,
    pub comments: usize,
}

/// Seed every table that is still empty. Tables with rows are left alone.
pub fn run(pool: &DbPool) -> anyhow::Result<SeedReport> {
    let conn = pool.get()?;
    let mut rng = rand::thread_rng();
    let mut report = SeedReport::default();

    if is_empty(&conn, "categories")? {
        for name in CATEGORIES {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        }
        report.categories = CATEGORIES.len();
    }

    if is_empty(&conn, "users")? {
        let hash = bcrypt::hash(DEFAULT_PASSWORD, bcrypt::DEFAULT_COST)?;
        for (name, email, is_admin) in USERS {
            conn.execute(
                "INSERT INTO users (name, email, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)",
                params![name, email, hash, is_admin],
            )?;
        }
        report.users = USERS.len();
    }

    if is_empty(&conn, "restaurants")? {
        let category_ids = ids(&conn, "categories")?;
        for n in 0..RESTAURANT_COUNT {
            let name = format!(
                "{} {}",
                ADJECTIVES.choose(&mut rng).copied().unwrap_or("Golden"),
                NOUNS.choose(&mut rng).copied().unwrap_or("Table"),
            );
            conn.execute(
                "INSERT INTO restaurants
                    (name, tel, address, opening_hours, description, image, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    name,
                    format!("(02) {:04}-{:04}", rng.gen_range(0..10_000), rng.gen_range(0..10_000)),
                    format!(
                        "{} {}",
                        rng.gen_range(1..500),
                        STREETS.choose(&mut rng).copied().unwrap_or("Main St")
                    ),
                    format!("{:02}:00", rng.gen_range(7..12)),
                    paragraph(&mut rng, 3),
                    format!("https://loremflickr.com/320/240/restaurant,food/?lock={}", n + 1),
                    category_ids.choose(&mut rng).copied(),
                ],
            )?;
        }
        report.restaurants = RESTAURANT_COUNT;
    }

    if is_empty(&conn, "comments")? {
        let user_ids = ids(&conn, "users")?;
        let restaurant_ids = ids(&conn, "restaurants")?;
        if user_ids.is_empty() || restaurant_ids.is_empty() {
            tracing::warn!("No users or restaurants to attach comments to");
        } else {
            for _ in 0..COMMENT_COUNT {
                conn.execute(
                    "INSERT INTO comments (text, user_id, restaurant_id) VALUES (?1, ?2, ?3)",
                    params![
                        sentence(&mut rng),
                        user_ids.choose(&mut rng).copied(),
                        restaurant_ids.choose(&mut rng).copied(),
                    ],
                )?;
            }
            report.comments = COMMENT_COUNT;
        }
    }

    tracing::info!(?report, "Seeding complete");
    Ok(report)
}

fn is_empty(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(&format!("SELECT COUNT(*) = 0 FROM {}", table), [], |row| {
        row.get(0)
    })
}

fn ids(conn: &Connection, table: &str) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {}", table))?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn sentence(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(4..10);
    let words: Vec<&str> = (0..len)
        .filter_map(|_| WORDS.choose(&mut *rng).copied())
        .collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn paragraph(rng: &mut impl Rng, sentences: usize) -> String {
    (0..sentences)
        .map(|_| sentence(&mut *rng))
        .collect::<Vec<_>>()
        .join(" ")
}
