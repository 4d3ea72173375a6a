use std::sync::RwLock;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use sqlx::MySqlPool;

/// Expected capacity and false-positive rate.
/// A hostel rarely has more than a few thousand accounts.
const FILTER_CAPACITY: usize = 20_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Probabilistic set of registered emails. A negative answer is definite,
/// a positive one has to be confirmed elsewhere.
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailFilter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }

    /// Check if an email might be registered (false positives possible).
    /// A poisoned lock answers "maybe" so callers fall through to the database.
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        match self.inner.read() {
            Ok(filter) => filter.contains(&email),
            Err(_) => true,
        }
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.inner.write() {
            filter.add(&email);
        }
    }

    pub fn remove(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.inner.write() {
            filter.remove(&email);
        }
    }

    /// Insert a batch of normalized emails under one lock.
    fn insert_batch(&self, emails: &[String]) {
        if let Ok(mut filter) = self.inner.write() {
            for email in emails {
                filter.add(email);
            }
        }
    }

    /// Warm up the filter using streaming + batching.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_emails_are_reported_case_insensitively() {
        let filter = EmailFilter::new();
        assert!(!filter.might_exist("alice@mess.com"));

        filter.insert("Alice@Mess.com");
        assert!(filter.might_exist("alice@mess.com"));

        filter.remove("alice@mess.com");
        assert!(!filter.might_exist("alice@mess.com"));
    }
}
