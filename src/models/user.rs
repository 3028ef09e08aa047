use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents a user row in the directory's `users` table.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryUser {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's full name, if known.
    pub name: Option<String>,
    /// The user's email address (unique in the directory).
    pub email: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The code this user hands out to people they refer.
    pub referral_code: Option<String>,
    /// The referral code of whoever referred this user.
    pub referred_by: Option<String>,
}

/// A directory user annotated with the referral level it was found at.
#[derive(Debug, Clone, Serialize)]
pub struct ReferralUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub referral_code: Option<String>,
    pub referred_by: Option<String>,
    /// 1, 2 or 3: the BFS distance from the root user.
    pub level: u8,
}

impl ReferralUser {
    /// Projects a directory user into a forest entry at the given level.
    pub fn from_user(user: DirectoryUser, level: u8) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            level,
        }
    }
}

/// The set of referral trees rooted at one user, expressed as three levels.
///
/// Each level holds the users whose referral chain first reaches the root at
/// that BFS distance. Expansion stops at level 3 regardless of how deep the
/// chains actually go.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferralForest {
    pub level1: Vec<ReferralUser>,
    pub level2: Vec<ReferralUser>,
    pub level3: Vec<ReferralUser>,
}

impl ReferralForest {
    /// Total number of entries across all three levels.
    pub fn total(&self) -> usize {
        self.level1.len() + self.level2.len() + self.level3.len()
    }
}
