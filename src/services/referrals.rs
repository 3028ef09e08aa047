use std::collections::HashSet;

use crate::{
    error::Result,
    models::user::{DirectoryUser, ReferralForest, ReferralUser},
    repositories::directory::Directory,
};

/// Hard depth cap on referral expansion. Bounds both query fan-out and
/// response size.
const MAX_LEVELS: u8 = 3;

/// Expands a referral code into the three-level forest of referred users.
///
/// Breadth-first: level N+1 is fetched with the deduplicated set of referral
/// codes collected at level N, one batched predicate per level, so levels are
/// inherently sequential. Within a level, users come back newest first.
///
/// Dedup is level-local only: a user reachable through two different codes at
/// different depths can appear at both levels. Known ambiguity, kept as-is.
///
/// Referral data is best effort: a gateway failure at any level is logged and
/// that level (and everything below it) comes back empty instead of failing
/// the request.
pub async fn build_forest<D: Directory>(directory: &D, root_code: &str) -> ReferralForest {
    let mut forest = ReferralForest::default();
    let mut codes = vec![root_code.to_string()];

    for level in 1..=MAX_LEVELS {
        if codes.is_empty() {
            break;
        }

        let users = match directory.find_all_referred_by(&codes).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!("⚠️ Referral lookup failed at level {}: {}", level, e);
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let mut next_codes = Vec::new();
        for user in &users {
            if let Some(code) = user.referral_code.as_deref().filter(|c| !c.is_empty()) {
                if seen.insert(code.to_string()) {
                    next_codes.push(code.to_string());
                }
            }
        }

        let annotated: Vec<ReferralUser> = users
            .into_iter()
            .map(|user| ReferralUser::from_user(user, level))
            .collect();
        match level {
            1 => forest.level1 = annotated,
            2 => forest.level2 = annotated,
            _ => forest.level3 = annotated,
        }

        codes = next_codes;
    }

    forest
}

/// Single-hop reverse lookup: the directory user whose referral code equals
/// the subject's `referred_by`.
///
/// Returns `None` when the subject is unknown, was not referred, or carries
/// a `referred_by` that matches no existing referral code.
pub async fn find_referrer<D: Directory>(
    directory: &D,
    email: &str,
) -> Result<Option<DirectoryUser>> {
    let Some(user) = directory.find_by_email(email).await? else {
        return Ok(None);
    };
    let Some(code) = user.referred_by.filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    directory.find_by_referral_code(&code).await
}
