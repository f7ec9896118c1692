pub mod browse;
pub mod lock;
pub mod rating_events;
pub mod sync_runs;

pub use browse::{EventSort, SortField, SortOrder};
pub use rating_events::{PgRatingEventStore, UpsertOutcome};

use anyhow::Context;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
