use anyhow::Context;
use contract_map_lib::{parse_data_date, AppConfig, DashboardApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let date = std::env::args()
        .nth(1)
        .map(|value| parse_data_date(&value))
        .transpose()
        .context("expected a data date as YYYYMMDD or YYYY-MM-DD")?;

    let app = DashboardApp::initialize(AppConfig::from_env())?;
    let snapshot = app.load(date).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
