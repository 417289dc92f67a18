use anyhow::Result;
use grc_dashboard::DashboardView;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = grc_dashboard::build()?;
    let view = DashboardView::from_app(&app);

    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
