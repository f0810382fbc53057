use chrono::Local;
use liftscrape::{config::ScrapeConfig, info_time, process::process_site, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let Some(config) = ScrapeConfig::from_args()? else {
        return Ok(());
    };
    process_site(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
