mod common;

use std::cell::Cell;

use brandscout::browser::DriverError;
use brandscout::config::{FuzzySettings, ScrapeConfig};
use brandscout::export;
use brandscout::input::{parse_brands, BrandRecord};
use brandscout::pipeline::PipelineError;
use brandscout::sites::Site;
use brandscout::{MatchResult, Pipeline, RunOutcome, RunState};
use common::{test_site, FakeBrowser, RecordingProgress};
use tokio_util::sync::CancellationToken;

const ACME_SHOES_URL: &str = "https://x.test/search?q=Acme+shoes";
const ACME_BOOTS_URL: &str = "https://x.test/search?q=Acme+boots";

fn acme_shoes() -> Vec<BrandRecord> {
    let csv = "Brand,Keyword1\nAcme,shoes\n";
    parse_brands(csv.as_bytes()).unwrap().records
}

fn rows(outcome: RunOutcome) -> Vec<MatchResult> {
    match outcome {
        RunOutcome::Completed(rows) => rows,
        other => panic!("expected completed run, got {other:?}"),
    }
}

fn urls(rows: &[MatchResult]) -> Vec<&str> {
    rows.iter().map(|r| r.product_url.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn brand_in_link_text_is_accepted() {
    let config = ScrapeConfig::default();
    let (browser, log) = FakeBrowser::new();
    let browser = browser.page(
        ACME_SHOES_URL,
        r#"<a href="https://x.test/item/1">Acme Shoes Deluxe</a>"#,
    );

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    let rows = rows(outcome);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brand, "Acme");
    assert_eq!(rows[0].keyword, "shoes");
    assert_eq!(rows[0].site, "X");
    assert_eq!(rows[0].product_url, "https://x.test/item/1");
    assert_eq!(pipeline.state(), RunState::Completed);

    let log = log.borrow();
    assert_eq!(log.visited, [ACME_SHOES_URL]);
    assert_eq!(log.scrolls, 1);
    assert!(log.shut_down);
}

#[tokio::test(start_paused = true)]
async fn unrelated_link_text_is_rejected() {
    let config = ScrapeConfig::default();
    let (browser, log) = FakeBrowser::new();
    let page = r#"<a href="https://x.test/item/1">Globex Shoes</a>"#;
    let browser = browser.page(ACME_SHOES_URL, page);

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();

    assert_eq!(outcome, RunOutcome::NoResults);
    assert_eq!(pipeline.state(), RunState::Completed);
    assert!(log.borrow().shut_down);
}

#[tokio::test(start_paused = true)]
async fn matching_uses_rendered_link_text() {
    let config = ScrapeConfig::default();
    let (browser, _) = FakeBrowser::new();
    let browser = browser.page(
        ACME_SHOES_URL,
        r#"<a href="https://x.test/item/1"><em>Ac</em>me Deluxe</a>
           <a href="https://x.test/item/2">Deluxe<script>var b = "acme";</script></a>"#,
    );

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    let rows = rows(outcome);

    assert_eq!(urls(&rows), ["https://x.test/item/1"]);
}

#[tokio::test(start_paused = true)]
async fn cap_limits_rows_per_task() {
    let config = ScrapeConfig {
        max_links_per_site: 1,
        ..Default::default()
    };
    let (browser, _log) = FakeBrowser::new();
    let browser = browser.page(
        ACME_SHOES_URL,
        r#"<a href="https://x.test/item/1">Acme runner</a>
           <a href="https://x.test/item/2">Acme trainer</a>"#,
    );

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    let rows = rows(outcome);

    assert_eq!(urls(&rows), ["https://x.test/item/1"]);
}

#[tokio::test(start_paused = true)]
async fn no_brands_means_no_browser() {
    let config = ScrapeConfig::default();
    let launched = Cell::new(false);
    let table = parse_brands("Brand,Keyword1\n".as_bytes()).unwrap();

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline
        .run(&table.records, || {
            launched.set(true);
            Ok(FakeBrowser::new().0)
        })
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoResults);
    assert!(!launched.get());
}

#[tokio::test(start_paused = true)]
async fn session_start_failure_is_fatal() {
    let config = ScrapeConfig::default();
    let progress = RecordingProgress::default();
    let mut pipeline = Pipeline::new(&config, vec![test_site(false)])
        .with_progress(progress.clone());

    let err = pipeline
        .run(&acme_shoes(), || -> Result<FakeBrowser, DriverError> {
            Err(DriverError::Launch(anyhow::anyhow!("chrome not found")))
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::SessionStart(DriverError::Launch(_))
    ));
    assert!(err.to_string().contains("chrome not found"));
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(progress.updates.borrow().is_empty());
    assert_eq!(progress.finished.borrow().as_deref(), Some("Failed"));
}

#[tokio::test(start_paused = true)]
async fn failed_task_is_skipped_and_run_continues() {
    let config = ScrapeConfig::default();
    let brands = vec![BrandRecord::new("Acme", ["shoes", "boots"])];
    let (browser, log) = FakeBrowser::new();
    let boots = r#"<a href="https://x.test/item/9">ACME boots</a>"#;
    let browser = browser.broken(ACME_SHOES_URL).page(ACME_BOOTS_URL, boots);

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let rows = rows(pipeline.run(&brands, || Ok(browser)).await.unwrap());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].keyword, "boots");
    let log = log.borrow();
    assert_eq!(log.visited.len(), 2);
    assert_eq!(log.scrolls, 1);
    assert!(log.shut_down);
}

#[tokio::test(start_paused = true)]
async fn url_matched_site_stays_gated_without_fuzzy() {
    let config = ScrapeConfig {
        fuzzy: FuzzySettings::disabled(),
        ..Default::default()
    };
    let page = r#"<a href="https://x.test/item/acme-1">Anything</a>
                  <a href="https://x.test/item/globex-2">Acme in text only</a>"#;

    let (browser, _) = FakeBrowser::new();
    let browser = browser.page(ACME_SHOES_URL, page);
    let mut pipeline = Pipeline::new(&config, vec![test_site(true)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    assert_eq!(urls(&rows(outcome)), ["https://x.test/item/acme-1"]);

    let (browser, _) = FakeBrowser::new();
    let browser = browser.page(ACME_SHOES_URL, page);
    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    assert_eq!(rows(outcome).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn made_in_china_unions_fallback_selectors() {
    let config = ScrapeConfig::default();
    let url = concat!(
        "https://www.made-in-china.com/products-search/",
        "hot-china-products/acme-shoes.html?page=1"
    );
    let page = r#"
        <a href="/prod/1">Acme sneaker</a>
        <div class="product-item">
          <a href="https://www.made-in-china.com/showroom/2">ACME slipper</a>
        </div>
        <div class="item-link"><a href="https://elsewhere.test/3">Acme clone</a></div>
    "#;
    let (browser, _) = FakeBrowser::new();
    let browser = browser.page(url, page);

    let sites = vec![Site::MadeInChina.profile().clone()];
    let mut pipeline = Pipeline::new(&config, sites);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    let rows = rows(outcome);

    assert_eq!(
        urls(&rows),
        [
            "https://www.made-in-china.com/prod/1",
            "https://www.made-in-china.com/showroom/2",
        ]
    );
    assert!(rows.iter().all(|r| r.site == "Made-in-China"));
}

#[tokio::test(start_paused = true)]
async fn progress_reports_every_task_and_reaches_one() {
    let config = ScrapeConfig::default();
    let brands = vec![
        BrandRecord::new("Acme", ["shoes", "boots"]),
        BrandRecord::new("Globex", ["widgets"]),
    ];
    let progress = RecordingProgress::default();
    let (browser, _) = FakeBrowser::new();

    let mut second = test_site(false);
    second.name = "Y".to_string();
    let sites = vec![test_site(false), second];
    let mut pipeline = Pipeline::new(&config, sites)
        .with_progress(progress.clone());
    let outcome = pipeline.run(&brands, || Ok(browser)).await.unwrap();
    assert_eq!(outcome, RunOutcome::NoResults);

    let updates = progress.updates.borrow();
    assert_eq!(updates.len(), 6);
    assert_eq!(updates[0].1, "Searching X for 'Acme shoes'...");
    assert_eq!(updates[1].1, "Searching Y for 'Acme shoes'...");
    assert_eq!(updates[5].1, "Searching Y for 'Globex widgets'...");
    assert!(updates.windows(2).all(|w| w[0].0 < w[1].0));
    assert!((updates[5].0 - 1.0).abs() < f64::EPSILON);
    assert_eq!(progress.finished.borrow().as_deref(), Some("No results"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_releases_session() {
    let config = ScrapeConfig::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (browser, log) = FakeBrowser::new();

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)])
        .with_cancellation(cancel);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled(vec![]));
    assert_eq!(pipeline.state(), RunState::Failed);
    let log = log.borrow();
    assert!(log.visited.is_empty());
    assert!(log.shut_down);
}

#[tokio::test(start_paused = true)]
async fn exported_rows_read_back_unchanged() {
    let config = ScrapeConfig::default();
    let (browser, _) = FakeBrowser::new();
    let browser = browser.page(
        ACME_SHOES_URL,
        r#"<a href="/item/1" title="Acme">One</a>
           <a href="/item/2" title="acme, inc.">Two</a>"#,
    );

    let mut pipeline = Pipeline::new(&config, vec![test_site(false)]);
    let outcome = pipeline.run(&acme_shoes(), || Ok(browser)).await.unwrap();
    let rows = rows(outcome);
    assert_eq!(rows.len(), 2);

    let mut buf = Vec::new();
    export::write_csv(&rows, &mut buf).unwrap();
    assert_eq!(export::read_csv(buf.as_slice()).unwrap(), rows);
}
