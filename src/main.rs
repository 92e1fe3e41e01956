use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use sitesift::config::ScraperConfig;
use sitesift::results::{ScrapeRequest, ScrapeResponse};
use sitesift::{Scraper, server};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let outcome = match args.command {
        Command::Scrape {
            url,
            config,
            pretty,
        } => scrape(&url, config.as_deref(), pretty).await,
        Command::Serve { bind, config } => match build_scraper(config.as_deref()) {
            Ok(scraper) => {
                log_webdriver(scraper.config());
                server::serve(scraper, bind).await
            }
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn scrape(
    url: &str,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ScrapeRequest::new(url)?;
    let scraper = build_scraper(config)?;
    log_webdriver(scraper.config());

    let started = std::time::Instant::now();
    let result = scraper.scrape(&request).await;
    ::log::info!(
        "Scrape of {} finished in {:.2} seconds",
        url,
        started.elapsed().as_secs_f64()
    );

    let response = ScrapeResponse { result };
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(())
}

fn build_scraper(config: Option<&Path>) -> Result<Scraper, Box<dyn std::error::Error>> {
    match config {
        Some(path) => Scraper::with_config_file(path),
        None => Ok(Scraper::new(ScraperConfig::default().with_env_overrides())?),
    }
}

fn log_webdriver(config: &ScraperConfig) {
    ::log::info!(
        "JavaScript-heavy pages are rendered through the WebDriver server at {} \
         (set WEBDRIVER_URL to change it)",
        config.webdriver_url
    );
}
