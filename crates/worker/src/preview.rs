use stockstream_core::recommend::RecommendationEngine;
use stockstream_core::storage::PgRatingEventStore;

/// Score the stored events and log the top `limit` recommendations.
pub async fn log_top_recommendations(
    store: PgRatingEventStore,
    limit: usize,
) -> anyhow::Result<()> {
    let engine = RecommendationEngine::new(store);
    let recommendations = engine.get_recommendations(limit).await?;

    if recommendations.is_empty() {
        tracing::info!("no recommendations available");
        return Ok(());
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        tracing::info!(
            rank = rank + 1,
            ticker = %rec.event.ticker,
            company = %rec.event.company,
            score = %format!("{:.1}", rec.score),
            confidence = %rec.confidence,
            reason = %rec.reason,
            "recommendation"
        );
    }
    Ok(())
}
