use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

pub async fn init_db(database_url: &str, max_connections: u32) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .expect("Failed to connect to database")
}
