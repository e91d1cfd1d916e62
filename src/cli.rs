use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

use brandscout::config::{FuzzySettings, ScrapeConfig};
use brandscout::export::ExportFormat;
use brandscout::sites::Site;

#[derive(Parser, Debug)]
#[command(name = "brandscout")]
#[command(about = "Search B2B marketplaces for listings that use your brand names")]
#[command(version)]
pub struct Cli {
    /// CSV with a 'Brand' column and one or more 'Keyword' columns
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Sites to search (comma-separated: alibaba, dhgate, made-in-china)
    #[arg(
        long,
        env = "BRANDSCOUT_SITES",
        value_delimiter = ',',
        default_value = "alibaba,dhgate,made-in-china"
    )]
    pub sites: Vec<Site>,

    /// Disable fuzzy matching (exact brand substring only)
    #[arg(long, env = "BRANDSCOUT_NO_FUZZY")]
    pub no_fuzzy: bool,

    /// Fuzzy matching threshold in percent (70-100)
    #[arg(long, env = "BRANDSCOUT_THRESHOLD", default_value_t = 80)]
    pub threshold: u8,

    /// Maximum links kept per site for each brand-keyword search (1-50)
    #[arg(long, env = "BRANDSCOUT_MAX_LINKS", default_value_t = 12)]
    pub max_links: usize,

    /// Seconds to wait after scrolling to the bottom (1-10)
    #[arg(long, env = "BRANDSCOUT_SCROLL_DELAY", default_value_t = 3)]
    pub scroll_delay: u64,

    /// Seconds to wait after a results page loads (3-15)
    #[arg(long, env = "BRANDSCOUT_PAGE_DELAY", default_value_t = 5)]
    pub page_delay: u64,

    /// Show the browser window instead of running headless
    #[arg(long, env = "BRANDSCOUT_HEADED")]
    pub headed: bool,

    /// Path to a Chrome/Chromium executable (auto-detected if omitted)
    #[arg(long, env = "BRANDSCOUT_CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Directory for the exported results
    #[arg(short, long, env = "BRANDSCOUT_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Which files to write
    #[arg(short, long, env = "BRANDSCOUT_FORMAT", value_enum, default_value_t = ExportFormat::Both)]
    pub format: ExportFormat,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    pub fn to_config(&self) -> ScrapeConfig {
        let fuzzy = if self.no_fuzzy {
            FuzzySettings::disabled()
        } else {
            FuzzySettings::enabled(self.threshold)
        };

        ScrapeConfig {
            sites: self.sites.iter().copied().collect::<BTreeSet<_>>(),
            fuzzy,
            max_links_per_site: self.max_links,
            scroll_delay_secs: self.scroll_delay,
            page_delay_secs: self.page_delay,
            headless: !self.headed,
            chrome_path: self.chrome_path.clone(),
        }
    }
}
