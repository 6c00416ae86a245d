use ga_export::{client::AnalyticsClient, config::ExportConfig, pipeline::Exporter};
use tracing::info;

/// Same runs as `export`, but one file per dataset covering the whole range.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ga_export::init_tracing();

    let config = ExportConfig::load_or(ExportConfig::users_per_month)?;
    let client = AnalyticsClient::connect(&config)?;
    let exporter = Exporter::new(client, config.page_size);

    for run in &config.runs {
        let summary = exporter
            .dump_totals(&config.data_root, run, &config.datasets)
            .await?;
        info!(
            "Finished {}: {} downloaded, {} already present",
            run.name, summary.downloaded, summary.skipped
        );
    }
    Ok(())
}
