use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Display data for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub phone_number: String,
}

/// Fetch a profile. A user without a profile is not an error.
pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    let profile = conn
        .query_row(
            "SELECT user_id, display_name, phone_number FROM profiles WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserProfile {
                    user_id: row.get(0)?,
                    display_name: row.get(1)?,
                    phone_number: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(profile)
}

/// Create or replace a profile.
pub fn upsert_profile(conn: &Connection, profile: &UserProfile) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, display_name, phone_number, updated_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(user_id) DO UPDATE SET \
            display_name = excluded.display_name, phone_number = excluded.phone_number, updated_at = excluded.updated_at",
        params![
            profile.user_id,
            profile.display_name,
            profile.phone_number,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}
