use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

use crate::model::company::Company;

/// Frontend host -> tenant company. Domains change rarely; a short TTL keeps
/// re-pointed domains from resolving stale for long.
static DOMAIN_CACHE: Lazy<Cache<String, Company>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(600))
        .build()
});

#[inline]
fn normalize(domain: &str) -> String {
    domain.trim().to_lowercase()
}

pub async fn lookup(domain: &str) -> Option<Company> {
    DOMAIN_CACHE.get(&normalize(domain)).await
}

pub async fn store(domain: &str, company: Company) {
    DOMAIN_CACHE.insert(normalize(domain), company).await;
}

pub async fn invalidate(domain: &str) {
    DOMAIN_CACHE.invalidate(&normalize(domain)).await;
}
