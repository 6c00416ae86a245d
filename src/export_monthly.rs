use ga_export::{client::AnalyticsClient, config::ExportConfig, pipeline::Exporter};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ga_export::init_tracing();

    let config = ExportConfig::load()?;
    let client = AnalyticsClient::connect(&config)?;
    let exporter = Exporter::new(client, config.page_size);

    for run in &config.runs {
        let summary = exporter
            .dump(&config.data_root, run, &config.datasets)
            .await?;
        info!(
            "Finished {}: {} downloaded, {} already present",
            run.name, summary.downloaded, summary.skipped
        );
    }
    Ok(())
}
