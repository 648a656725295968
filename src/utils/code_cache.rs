use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => employee code is TAKEN
/// false => code is AVAILABLE (usually we store only taken)
pub static CODE_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single employee code as taken
pub async fn mark_taken(code: &str) {
    CODE_CACHE.insert(code.trim().to_uppercase(), true).await;
}

/// Check if an employee code is taken
pub async fn is_taken(code: &str) -> bool {
    CODE_CACHE
        .get(&code.trim().to_uppercase())
        .await
        .unwrap_or(false)
}

/// Batch mark codes as taken
async fn batch_mark(codes: &[String]) {
    let futures: Vec<_> = codes
        .iter()
        .map(|c| CODE_CACHE.insert(c.trim().to_uppercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only codes of RECENTLY joined employees into the cache (batched)
pub async fn warmup_code_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT employee_code
        FROM employees
        WHERE join_date >= NOW() - INTERVAL ? DAY
        ORDER BY join_date DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row?;
        batch.push(code);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining codes
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Employee code cache warmup complete: {} recent joiners (last {} days)",
        total_count,
        days
    );

    Ok(())
}
