use sqlx::MySqlPool;

use crate::error::AppResult;
use crate::repository::UserStore;
use crate::utils::email_cache::EmailCache;
use crate::utils::email_filter::EmailFilter;

/// Fast path for "is this email free?" during registration.
///
/// 1. cuckoo filter, fast negative
/// 2. moka cache, fast positive
/// 3. database fallback
///
/// The unique index on `users.email` stays the source of truth; this only
/// saves round trips.
#[derive(Default)]
pub struct EmailIndex {
    filter: EmailFilter,
    cache: EmailCache,
}

impl EmailIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available<S: UserStore>(&self, email: &str, store: &S) -> AppResult<bool> {
        if !self.filter.might_exist(email) {
            return Ok(true);
        }

        if self.cache.is_taken(email).await {
            return Ok(false);
        }

        match store.find_user_by_email(email).await? {
            Some(_) => {
                self.cache.mark_taken(email).await;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    pub async fn mark_taken(&self, email: &str) {
        self.filter.insert(email);
        self.cache.mark_taken(email).await;
    }

    pub async fn forget(&self, email: &str) {
        self.filter.remove(email);
        self.cache.forget(email).await;
    }

    pub async fn warmup_filter(&self, pool: &MySqlPool, batch_size: usize) -> anyhow::Result<()> {
        self.filter.warmup(pool, batch_size).await
    }

    pub async fn warmup_cache(
        &self,
        pool: &MySqlPool,
        days: u32,
        batch_size: usize,
    ) -> anyhow::Result<()> {
        self.cache.warmup(pool, days, batch_size).await
    }
}
