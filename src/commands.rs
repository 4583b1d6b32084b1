use std::path::Path;

use anyhow::Context;
use sopqa_core::AppBuilder;

use crate::shell::{Settings, render_result};

pub(crate) async fn ingest(app: &AppBuilder, dir: &Path, recreate: bool) -> anyhow::Result<()> {
    let processor = app.build_processor()?;
    let ingestor = app.build_ingestor()?;

    let chunks = processor
        .process_directory(dir)
        .await
        .with_context(|| format!("failed to process {}", dir.display()))?;
    if chunks.is_empty() {
        tracing::warn!("no chunks produced from {}, index left untouched", dir.display());
        return Ok(());
    }
    tracing::info!("Total chunks: {}", chunks.len());

    let manager = ingestor.manager();
    if recreate {
        manager.delete_index().await;
    }
    manager
        .create_index(app.config().embedding.dimensions)
        .await
        .context("failed to create index")?;

    let uploaded = ingestor.ingest(&chunks).await.context("ingestion failed")?;
    println!("Indexed {uploaded} chunks into '{}'", manager.index_name());
    Ok(())
}

pub(crate) async fn create_index(app: &AppBuilder, dimensions: Option<usize>) -> anyhow::Result<()> {
    let manager = app.build_index_manager()?;
    let dimensions = dimensions.unwrap_or(app.config().embedding.dimensions);
    anyhow::ensure!(dimensions > 0, "vector dimensions must be greater than zero");
    manager
        .create_index(dimensions)
        .await
        .context("failed to create index")?;
    println!("Index '{}' ready ({dimensions} dimensions)", manager.index_name());
    Ok(())
}

pub(crate) async fn delete_index(app: &AppBuilder) -> anyhow::Result<()> {
    app.build_index_manager()?.delete_index().await;
    Ok(())
}

pub(crate) async fn status(app: &AppBuilder) -> anyhow::Result<()> {
    let config = app.config();
    println!("Config:     {}", app.config_path().display());
    println!("Search:     {} (index '{}')", or_unset(&config.search.endpoint), config.search.index_name);
    println!(
        "Embedding:  {} / {} ({} dimensions)",
        or_unset(&config.embedding.endpoint),
        or_unset(&config.embedding.deployment),
        config.embedding.dimensions
    );
    println!(
        "Generation: {} / {}",
        or_unset(&config.generation.endpoint),
        or_unset(&config.generation.deployment)
    );

    let manager = app.build_index_manager()?;
    let count = manager
        .document_count()
        .await
        .context("failed to read document count")?;
    println!("Documents:  {count}");
    Ok(())
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(unset)" } else { value }
}

pub(crate) async fn ask(
    app: &AppBuilder,
    question: &str,
    top_k: Option<usize>,
    show_sources: bool,
) -> anyhow::Result<()> {
    let question = question.trim();
    anyhow::ensure!(!question.is_empty(), "question must not be empty");

    let pipeline = app.build_pipeline()?;
    let settings = Settings {
        top_k: top_k.unwrap_or(app.config().query.top_k),
        show_sources,
    };
    let result = pipeline.query(question, settings.top_k).await?;
    print!("{}", render_result(&result, settings.show_sources));
    Ok(())
}
