use anyhow::Context;
use clap::Parser;
use spider_images::{BingImageSpider, CrawlerBuilder, CsvKeywordSource};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "spider-images",
    version,
    about = "Download image search results for every keyword in a CSV file"
)]
struct Cli {
    #[arg(long, default_value = "keywords.csv", help = "CSV file with a 'keyword' column")]
    keywords: PathBuf,
    #[arg(long, default_value = "downloaded_images", help = "Folder the images are written to")]
    output: PathBuf,
    #[arg(long, default_value_t = 5, help = "Keywords crawled concurrently")]
    workers: usize,
    #[arg(long, default_value_t = 60, help = "Seconds allowed per keyword")]
    timeout: u64,
    #[arg(long, default_value_t = 30, help = "Seconds allowed per HTTP request")]
    request_timeout: u64,
    #[arg(long, help = "Crawl keywords in file order instead of last row first")]
    keep_order: bool,
    #[arg(long, help = "Print crawl statistics to stderr when done")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spider_images=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let crawler = CrawlerBuilder::new(BingImageSpider::default())
        .destination_root(&cli.output)
        .concurrency(cli.workers)
        .per_keyword_timeout(Duration::from_secs(cli.timeout))
        .request_timeout(Duration::from_secs(cli.request_timeout))
        .build()
        .context("invalid crawler settings")?;

    let source = CsvKeywordSource::new(&cli.keywords).reversed(!cli.keep_order);
    let report = crawler.run_source(&source).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );
    if cli.stats {
        eprintln!("{}", crawler.get_stats());
    }

    Ok(if report.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
