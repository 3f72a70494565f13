//! Transaction crawler CLI - downloads monthly sale/rental spreadsheets
//!
//! Examples:
//!   transaction-crawler                                   # last year, every type
//!   transaction-crawler --start 2025-01-01 --end 2025-12-31
//!   transaction-crawler --types apartment officetel --no-rent
//!   transaction-crawler --test                            # apartment sales, this month

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use transaction_crawler::crawler::config::delay_from_secs;
use transaction_crawler::crawler::utils::{month_start, one_year_before};
use transaction_crawler::crawler::{
    CrawlRequest, Crawler, CrawlerConfig, DateRange, OutputLayout, PlanRequest, PropertyType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PropertyTypeArg {
    #[value(alias = "A")]
    Apartment,
    #[value(alias = "B")]
    RowHouse,
    #[value(alias = "C")]
    DetachedHouse,
    #[value(alias = "D")]
    Officetel,
    #[value(alias = "G")]
    Land,
}

impl From<PropertyTypeArg> for PropertyType {
    fn from(arg: PropertyTypeArg) -> Self {
        match arg {
            PropertyTypeArg::Apartment => PropertyType::Apartment,
            PropertyTypeArg::RowHouse => PropertyType::RowHouse,
            PropertyTypeArg::DetachedHouse => PropertyType::DetachedHouse,
            PropertyTypeArg::Officetel => PropertyType::Officetel,
            PropertyTypeArg::Land => PropertyType::Land,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "transaction-crawler")]
#[command(about = "Download monthly real-estate transaction spreadsheets", long_about = None)]
struct Cli {
    /// Start date (YYYY-MM-DD, default: one year before --end)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, default: today)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Property types to download (default: all)
    #[arg(long, value_enum, num_args = 1..)]
    types: Vec<PropertyTypeArg>,

    /// Sales only, skip rentals
    #[arg(long)]
    no_rent: bool,

    /// Seconds to wait between downloads (default: 3, or CRAWL_DELAY_SECS)
    #[arg(long)]
    delay: Option<f64>,

    /// Apartment sales for the current month only
    #[arg(long)]
    test: bool,

    /// Put every file in this directory instead of the sale/rental trees
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = CrawlerConfig::from_env().context("invalid crawler configuration")?;
    if let Some(secs) = cli.delay {
        config.delay = delay_from_secs(secs)?;
    }
    if let Some(dir) = cli.output_dir.clone() {
        config.output = OutputLayout::Single(dir);
    }
    info!("Configuration loaded");

    let request = build_request(&cli, Local::now().date_naive())?;

    let mut crawler = Crawler::new(config);
    let report = crawler.run(&request).await.context("crawl aborted")?;

    std::process::exit(report.exit_code());
}

fn build_request(cli: &Cli, today: NaiveDate) -> Result<CrawlRequest> {
    if cli.test {
        return Ok(CrawlRequest {
            range: DateRange::new(month_start(today), today)?,
            plan: PlanRequest {
                property_types: vec![PropertyType::Apartment],
                include_rentals: false,
            },
        });
    }

    let end = cli.end.unwrap_or(today);
    let start = cli.start.unwrap_or_else(|| one_year_before(end));

    Ok(CrawlRequest {
        range: DateRange::new(start, end)?,
        plan: PlanRequest {
            property_types: cli.types.iter().map(|&t| PropertyType::from(t)).collect(),
            include_rentals: !cli.no_rent,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["transaction-crawler"]);
        let request = build_request(&cli, today()).unwrap();

        assert_eq!(request.range.start(), NaiveDate::from_ymd_opt(2025, 2, 16).unwrap());
        assert_eq!(request.range.end(), today());
        assert_eq!(request.plan.selected_types(), PropertyType::ALL.to_vec());
        assert!(request.plan.include_rentals);
    }

    #[test]
    fn test_types_accept_names_and_codes() {
        let cli = Cli::parse_from([
            "transaction-crawler",
            "--types",
            "land",
            "A",
            "row-house",
            "--no-rent",
        ]);
        let request = build_request(&cli, today()).unwrap();

        assert_eq!(
            request.plan.selected_types(),
            vec![PropertyType::Apartment, PropertyType::RowHouse, PropertyType::Land]
        );
        assert!(!request.plan.include_rentals);
    }

    #[test]
    fn test_mode_is_current_month_apartment_sales() {
        let cli = Cli::parse_from(["transaction-crawler", "--test", "--types", "land"]);
        let request = build_request(&cli, today()).unwrap();

        assert_eq!(request.range.start(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(request.range.end(), today());
        assert_eq!(request.plan.property_types, vec![PropertyType::Apartment]);
        assert!(!request.plan.include_rentals);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let cli = Cli::parse_from([
            "transaction-crawler",
            "--start",
            "2025-06-01",
            "--end",
            "2025-05-01",
        ]);
        assert!(build_request(&cli, today()).is_err());
    }
}
