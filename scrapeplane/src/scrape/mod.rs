//! Scraping: the per-target loop and the pool that runs one loop per
//! target of a job.

mod pool;
mod scrape_loop;
mod scraper;

pub use pool::ScrapePool;
pub use scrape_loop::{
    attach_target_labels, EXPORTED_LABEL_PREFIX, SAMPLES_SCRAPED_METRIC, SCRAPE_DURATION_METRIC,
    UP_METRIC,
};
pub use scraper::{NullScraper, ScrapeError, ScrapeFuture, Scraper};
