// src/pipeline/orchestrator.rs

//! Sweep orchestration.
//!
//! Drives work-units through the fetch -> cache -> extract -> validate ->
//! persist chain, strictly sequentially. Per-unit failures are counted in
//! the report and never abort a sweep; a later unit's duplicate check sees
//! every earlier insert of the same run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::models::{
    CandidateEvent, CandidatePeriod, Event, NewEvent, ScrapeConfig, StoreStatistics, SweepReport,
    UnitKey,
};
use crate::pipeline::validate;
use crate::services::{Extractor, PageFetcher};
use crate::store::SqliteStore;

/// Exact-name duplicates within this many years of an existing event are
/// treated as re-observations and skipped.
const DUPLICATE_YEAR_WINDOW: i64 = 5;

/// Dynasty pages swept by `sweep_dynasties`, in historical order.
pub const CHINESE_DYNASTIES: &[&str] = &[
    "夏朝",
    "商朝",
    "周朝",
    "秦朝",
    "汉朝",
    "三国",
    "晋朝",
    "南北朝",
    "隋朝",
    "唐朝",
    "五代十国",
    "宋朝",
    "元朝",
    "明朝",
    "清朝",
    "中華民國",
    "中华人民共和国",
];

// Civilization search terms, ancient through early modern.
const ANCIENT_TERMS: &[&str] = &[
    "Ancient Greece",
    "Ancient Rome",
    "Minoan civilization",
    "Mycenaean civilization",
    "Phoenicians",
    "Hittites",
    "Assyrians",
    "Babylonians",
    "Classical Greece",
    "Hellenistic period",
    "Roman Republic",
    "Carthage",
    "Byzantine Empire",
    "Viking Age",
    "Islamic Golden Age",
    "Holy Roman Empire",
    "Crusades",
    "Mongol Empire",
];

const MEDIEVAL_TERMS: &[&str] = &[
    "Black Death",
    "Hundred Years' War",
    "Ottoman Empire",
    "Renaissance",
    "Hanseatic League",
    "War of the Roses",
    "Italian Renaissance",
];

const EARLY_MODERN_TERMS: &[&str] = &[
    "Age of Discovery",
    "Reformation",
    "Scientific Revolution",
    "Age of Enlightenment",
    "Thirty Years' War",
    "Baroque period",
    "Colonialism",
    "Mercantilism",
];

/// Default term list for `sweep_terms`: ancient, medieval and early modern
/// civilization terms in that order.
pub fn default_civilization_terms() -> Vec<String> {
    ANCIENT_TERMS
        .iter()
        .chain(MEDIEVAL_TERMS)
        .chain(EARLY_MODERN_TERMS)
        .map(|term| term.to_string())
        .collect()
}

/// One phase of the full-timeline sweep: a year range sampled at a fixed
/// stride.
#[derive(Debug, Clone)]
pub struct SamplingPhase {
    pub name: &'static str,
    pub start_year: i32,
    pub end_year: i32,
    pub stride: usize,
}

impl SamplingPhase {
    /// Years sampled by this phase, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        (self.start_year..=self.end_year).step_by(self.stride.max(1))
    }

    /// The six default phases: sparse sampling in antiquity, every single
    /// year in the present century.
    pub fn default_phases() -> Vec<SamplingPhase> {
        vec![
            SamplingPhase { name: "Classical Period", start_year: -1000, end_year: 500, stride: 1000 },
            SamplingPhase { name: "Middle Ages", start_year: 501, end_year: 1500, stride: 50 },
            SamplingPhase { name: "Early Modern", start_year: 1501, end_year: 1800, stride: 25 },
            SamplingPhase { name: "19th Century", start_year: 1801, end_year: 1900, stride: 10 },
            SamplingPhase { name: "20th Century", start_year: 1901, end_year: 2000, stride: 5 },
            SamplingPhase { name: "21st Century", start_year: 2001, end_year: 2026, stride: 1 },
        ]
    }
}

/// Per-run knobs, resolved once from config and CLI flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Events below this importance are not persisted
    pub min_importance: i64,
    /// Skip cache reads (writes still happen)
    pub force_refresh: bool,
    /// Cooldown between work-units
    pub unit_delay: Duration,
    /// Cap passed to the extractor per work-unit
    pub max_events_per_unit: usize,
}

impl RunOptions {
    pub fn from_config(scrape: &ScrapeConfig, force_refresh: bool) -> Self {
        Self {
            min_importance: scrape.min_importance,
            force_refresh,
            unit_delay: Duration::from_millis(scrape.unit_delay_ms),
            max_events_per_unit: scrape.max_events_per_unit,
        }
    }
}

/// Receives coarse progress messages during a sweep.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, message: &str);
}

/// Default sink: forwards progress to the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&self, message: &str) {
        info!("{message}");
    }
}

/// Drives sweeps for one region.
pub struct Orchestrator {
    region: String,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Option<Arc<dyn Extractor>>,
    cache: CacheStore,
    store: SqliteStore,
    options: RunOptions,
    progress: Arc<dyn ProgressSink>,
}

impl Orchestrator {
    pub fn new(
        region: &str,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Option<Arc<dyn Extractor>>,
        cache: CacheStore,
        store: SqliteStore,
        options: RunOptions,
    ) -> Self {
        if extractor.is_none() {
            warn!("No extractor configured: persisting cached candidates as-is");
        }
        Self {
            region: region.to_string(),
            fetcher,
            extractor,
            cache,
            store,
            options,
            progress: Arc::new(LogProgress),
        }
    }

    /// Replace the default log-based progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    // --- Sweeps ---

    /// Sweep the year axis using phased sampling.
    pub async fn sweep_full_timeline(&self, phases: &[SamplingPhase]) -> SweepReport {
        info!("Sweeping full timeline for {}", self.region);
        let mut report = SweepReport::default();

        for phase in phases {
            self.progress.progress(&format!(
                "Processing {} ({} to {})",
                phase.name, phase.start_year, phase.end_year
            ));
            for year in phase.years() {
                self.process_unit(&UnitKey::Year(year), false, &mut report)
                    .await;
                self.cooldown().await;
            }
        }
        report
    }

    /// Sweep the fixed dynasty list, each dynasty page as one work-unit.
    pub async fn sweep_dynasties(&self) -> SweepReport {
        info!(
            "Sweeping {} dynasty pages for {}",
            CHINESE_DYNASTIES.len(),
            self.region
        );
        let mut report = SweepReport::default();

        for (i, dynasty) in CHINESE_DYNASTIES.iter().enumerate() {
            self.progress.progress(&format!(
                "Processing dynasty {}/{}: {dynasty}",
                i + 1,
                CHINESE_DYNASTIES.len()
            ));
            self.process_unit(&UnitKey::Entity(dynasty.to_string()), false, &mut report)
                .await;
            self.cooldown().await;
        }
        report
    }

    /// Sweep search terms; each term resolves to its top search hit and is
    /// cached under the term itself.
    pub async fn sweep_terms(&self, terms: &[String]) -> SweepReport {
        info!("Sweeping {} search terms for {}", terms.len(), self.region);
        let mut report = SweepReport::default();

        for (i, term) in terms.iter().enumerate() {
            self.progress
                .progress(&format!("Processing term {}/{}: {term}", i + 1, terms.len()));
            self.process_unit(&UnitKey::Entity(term.clone()), true, &mut report)
                .await;
            self.cooldown().await;
        }
        report
    }

    /// Extract and insert one period per name.
    pub async fn sweep_key_periods(&self, period_names: &[String]) -> SweepReport {
        info!(
            "Sweeping {} key periods for {}",
            period_names.len(),
            self.region
        );
        let mut report = SweepReport::default();

        for (i, name) in period_names.iter().enumerate() {
            self.progress.progress(&format!(
                "Processing period {}/{}: {name}",
                i + 1,
                period_names.len()
            ));
            self.process_period(name, &mut report).await;
            self.cooldown().await;
        }
        report
    }

    // --- Query pass-throughs ---

    /// Events of this region within a year range.
    pub async fn timeline(
        &self,
        start_year: i32,
        end_year: i32,
        min_importance: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Event>> {
        self.store
            .events_in_range(&self.region, start_year, end_year, min_importance, limit)
            .await
    }

    /// Keyword search within this region.
    pub async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<Event>> {
        self.store
            .events_matching_keyword(keyword, Some(&self.region), limit)
            .await
    }

    /// Roughly contemporaneous events across regions.
    pub async fn cross_regional_view(
        &self,
        year: i32,
        regions: &[String],
        importance_threshold: i64,
    ) -> Result<BTreeMap<String, Vec<Event>>> {
        self.store
            .cross_regional_events(year, regions, importance_threshold)
            .await
    }

    pub async fn statistics(&self) -> Result<StoreStatistics> {
        self.store.statistics().await
    }

    // --- Per-unit machinery ---

    /// Run one work-unit through the cache/fetch/extract/persist chain.
    /// Failures are recorded in the report, never propagated.
    async fn process_unit(&self, unit: &UnitKey, via_search: bool, report: &mut SweepReport) {
        if !self.options.force_refresh {
            match self.cache.get_processed(&self.region, unit).await {
                Ok(Some(candidates)) => {
                    debug!("Cache hit: {}_{unit} (processed)", self.region);
                    self.persist_candidates(candidates, report).await;
                    return;
                }
                Ok(None) => {}
                Err(error) => warn!("Processed-cache read failed for {unit}: {error}"),
            }
        }

        let mut page = None;
        if !self.options.force_refresh {
            match self.cache.get_raw(&self.region, unit).await {
                Ok(Some(cached)) => {
                    debug!("Cache hit: {}_{unit} (raw)", self.region);
                    page = Some(cached);
                }
                Ok(None) => {}
                Err(error) => warn!("Raw-cache read failed for {unit}: {error}"),
            }
        }

        let page = match page {
            Some(page) => page,
            None => match self.obtain_page(unit, via_search).await {
                Ok(Some(page)) => {
                    if let Err(error) = self.cache.put_raw(&self.region, unit, &page).await {
                        warn!("Raw-cache write failed for {unit}: {error}");
                    }
                    page
                }
                Ok(None) => {
                    info!("No page found for {unit}, skipping");
                    return;
                }
                Err(error) => {
                    warn!("Fetch failed for {unit}: {error}");
                    report.failed_fetch += 1;
                    return;
                }
            },
        };

        let Some(extractor) = &self.extractor else {
            debug!("No extractor, leaving {unit} at the raw tier");
            return;
        };

        let candidates = match extractor
            .extract_events(unit, &page, &self.region, self.options.max_events_per_unit)
            .await
        {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!("Extraction failed for {unit}: {error}");
                report.failed_extract += 1;
                return;
            }
        };

        // The processed tier holds everything extracted, including events a
        // later pass with a lower threshold may still want.
        if let Err(error) = self
            .cache
            .put_processed(&self.region, unit, &candidates)
            .await
        {
            warn!("Processed-cache write failed for {unit}: {error}");
        }

        self.persist_candidates(candidates, report).await;
    }

    async fn obtain_page(
        &self,
        unit: &UnitKey,
        via_search: bool,
    ) -> Result<Option<crate::models::PageContent>> {
        if !via_search {
            return self.fetcher.fetch(unit).await;
        }
        let hits = self.fetcher.search(&unit.to_string(), 3).await?;
        match hits.into_iter().next() {
            Some(hit) => self.fetcher.fetch(&UnitKey::Entity(hit.title)).await,
            None => Ok(None),
        }
    }

    /// Validate, threshold-filter, dedup and insert candidates one by one.
    async fn persist_candidates(&self, candidates: Vec<CandidateEvent>, report: &mut SweepReport) {
        for candidate in candidates {
            let event = if self.extractor.is_some() {
                match validate::validate_candidate(&candidate) {
                    Ok(event) => event,
                    Err(reason) => {
                        debug!("Dropping invalid candidate: {reason}");
                        report.skipped_invalid += 1;
                        continue;
                    }
                }
            } else {
                match validate::trust_candidate(&candidate, &self.region) {
                    Some(event) => event,
                    None => {
                        report.skipped_invalid += 1;
                        continue;
                    }
                }
            };

            // The threshold applies only to strictly-validated candidates;
            // trusted cached data is persisted as-is.
            if self.extractor.is_some() && event.importance_level < self.options.min_importance {
                debug!(
                    "Below threshold ({} < {}): {}",
                    event.importance_level, self.options.min_importance, event.event_name
                );
                report.skipped_below_threshold += 1;
                continue;
            }

            match self.is_duplicate(&event).await {
                Ok(true) => {
                    debug!(
                        "Skipping duplicate: {} ({})",
                        event.event_name, event.start_year
                    );
                    report.skipped_duplicate += 1;
                    continue;
                }
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        "Duplicate check failed for {}, inserting anyway: {error}",
                        event.event_name
                    );
                }
            }

            match self.store.insert_event(&event).await {
                Ok(_) => report.inserted += 1,
                Err(error) => warn!("Insert failed for {}: {error}", event.event_name),
            }
        }
    }

    /// An event is a duplicate when the same region already holds an event
    /// with the exact same name within the year window.
    async fn is_duplicate(&self, event: &NewEvent) -> Result<bool> {
        let window = DUPLICATE_YEAR_WINDOW as i32;
        let existing = self
            .store
            .events_in_range(
                &event.region,
                event.start_year.saturating_sub(window),
                event.start_year.saturating_add(window),
                None,
                200,
            )
            .await?;
        Ok(existing
            .iter()
            .any(|e| e.record.event_name == event.event_name))
    }

    async fn process_period(&self, name: &str, report: &mut SweepReport) {
        let unit = UnitKey::Entity(name.to_string());
        let page = match self.obtain_page(&unit, true).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                info!("No page found for period {name}, skipping");
                return;
            }
            Err(error) => {
                warn!("Fetch failed for period {name}: {error}");
                report.failed_fetch += 1;
                return;
            }
        };

        let candidate = match &self.extractor {
            Some(extractor) => {
                match extractor.extract_period(name, &page, &self.region).await {
                    Ok(Some(candidate)) => candidate,
                    Ok(None) => return,
                    Err(error) => {
                        warn!("Period extraction failed for {name}: {error}");
                        report.failed_extract += 1;
                        return;
                    }
                }
            }
            // Placeholder span, matching degraded-mode behavior elsewhere.
            None => CandidatePeriod {
                period_name: Some(name.to_string()),
                start_year: Some(0),
                end_year: Some(100),
                period_type: Some("independent".to_string()),
                description: Some(page.extract.chars().take(500).collect()),
                region: Some(self.region.clone()),
                ..CandidatePeriod::default()
            },
        };

        match validate::validate_period(&candidate, &self.region) {
            Ok(period) => match self.store.insert_period(&period).await {
                Ok(_) => report.periods_inserted += 1,
                Err(error) => warn!("Period insert failed for {name}: {error}"),
            },
            Err(reason) => {
                debug!("Dropping invalid period {name}: {reason}");
                report.skipped_invalid += 1;
            }
        }
    }

    async fn cooldown(&self) {
        if !self.options.unit_delay.is_zero() {
            tokio::time::sleep(self.options.unit_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::models::{PageContent, SearchHit};

    struct FakeFetcher {
        pages: HashMap<UnitKey, PageContent>,
        fail_units: HashSet<UnitKey>,
        fetch_calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(pages: Vec<(UnitKey, &str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(unit, extract)| {
                        let page = PageContent {
                            title: unit.to_string(),
                            extract: extract.to_string(),
                            source_url: None,
                        };
                        (unit, page)
                    })
                    .collect(),
                fail_units: HashSet::new(),
                fetch_calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, unit: UnitKey) -> Self {
            self.fail_units.insert(unit);
            self
        }

        fn calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, unit: &UnitKey) -> Result<Option<PageContent>> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_units.contains(unit) {
                return Err(AppError::transport(unit.to_string(), "connection refused"));
            }
            Ok(self.pages.get(unit).cloned())
        }

        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
            Ok(self
                .pages
                .keys()
                .filter_map(|unit| match unit {
                    UnitKey::Entity(name) if name == query => Some(SearchHit {
                        page_id: 1,
                        title: name.clone(),
                    }),
                    _ => None,
                })
                .collect())
        }
    }

    struct FakeExtractor {
        events: HashMap<UnitKey, Vec<CandidateEvent>>,
        period: Option<CandidatePeriod>,
        extract_calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn new(events: Vec<(UnitKey, Vec<CandidateEvent>)>) -> Self {
            Self {
                events: events.into_iter().collect(),
                period: None,
                extract_calls: AtomicUsize::new(0),
            }
        }

        fn with_period(mut self, period: CandidatePeriod) -> Self {
            self.period = Some(period);
            self
        }

        fn calls(&self) -> usize {
            self.extract_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        async fn extract_events(
            &self,
            unit: &UnitKey,
            _page: &PageContent,
            _region: &str,
            _max_events: usize,
        ) -> Result<Vec<CandidateEvent>> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.events.get(unit).cloned().unwrap_or_default())
        }

        async fn extract_period(
            &self,
            _name: &str,
            _page: &PageContent,
            _region: &str,
        ) -> Result<Option<CandidatePeriod>> {
            Ok(self.period.clone())
        }
    }

    fn candidate(name: &str, year: i64, importance: i64) -> CandidateEvent {
        CandidateEvent {
            event_name: Some(name.to_string()),
            start_year: Some(year),
            region: Some("Chinese".to_string()),
            importance_level: Some(importance),
            ..CandidateEvent::default()
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            min_importance: 5,
            force_refresh: false,
            unit_delay: Duration::ZERO,
            max_events_per_unit: 20,
        }
    }

    async fn orchestrator(
        cache_dir: &TempDir,
        fetcher: Arc<FakeFetcher>,
        extractor: Option<Arc<FakeExtractor>>,
        opts: RunOptions,
    ) -> Orchestrator {
        let store = SqliteStore::open_in_memory().await.unwrap();
        Orchestrator::new(
            "Chinese",
            fetcher,
            extractor.map(|e| e as Arc<dyn Extractor>),
            CacheStore::new(cache_dir.path()),
            store,
            opts,
        )
    }

    #[tokio::test]
    async fn test_dynasty_sweep_end_to_end() {
        let unit = UnitKey::Entity("唐朝".to_string());
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(vec![(unit.clone(), "唐朝页面内容")]));
        let extractor = Arc::new(FakeExtractor::new(vec![(
            unit.clone(),
            vec![
                candidate("贞观之治", 627, 8),
                candidate("开元盛世", 713, 4),
                candidate("安史之乱", 755, 9),
            ],
        )]));

        let orch = orchestrator(&dir, Arc::clone(&fetcher), Some(Arc::clone(&extractor)), options()).await;
        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        // Importance 4 filtered out, the other two inserted.
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped_below_threshold, 1);

        let events = orch.timeline(600, 800, None, 10).await.unwrap();
        assert_eq!(events.len(), 2);

        // The processed cache keeps all three.
        let cached = orch.cache.get_processed("Chinese", &unit).await.unwrap().unwrap();
        assert_eq!(cached.len(), 3);
    }

    #[tokio::test]
    async fn test_processed_cache_hit_skips_fetch_and_extract() {
        let unit = UnitKey::Year(1492);
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        cache
            .put_processed("Chinese", &unit, &[candidate("发现新大陆", 1492, 7)])
            .await
            .unwrap();

        let fetcher = Arc::new(FakeFetcher::new(vec![]));
        let extractor = Arc::new(FakeExtractor::new(vec![]));
        let orch = orchestrator(&dir, Arc::clone(&fetcher), Some(Arc::clone(&extractor)), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_cache_hit_skips_fetch_but_extracts() {
        let unit = UnitKey::Year(800);
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        cache
            .put_raw(
                "Chinese",
                &unit,
                &PageContent {
                    title: "800".to_string(),
                    extract: "year page".to_string(),
                    source_url: None,
                },
            )
            .await
            .unwrap();

        let fetcher = Arc::new(FakeFetcher::new(vec![]));
        let extractor = Arc::new(FakeExtractor::new(vec![(
            unit.clone(),
            vec![candidate("册封事件", 800, 6)],
        )]));
        let orch = orchestrator(&dir, Arc::clone(&fetcher), Some(Arc::clone(&extractor)), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn test_processed_tier_takes_precedence_over_raw() {
        let unit = UnitKey::Year(900);
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        cache
            .put_raw(
                "Chinese",
                &unit,
                &PageContent {
                    title: "900".to_string(),
                    extract: "raw page".to_string(),
                    source_url: None,
                },
            )
            .await
            .unwrap();
        cache
            .put_processed("Chinese", &unit, &[candidate("已处理事件", 900, 6)])
            .await
            .unwrap();

        let fetcher = Arc::new(FakeFetcher::new(vec![]));
        let extractor = Arc::new(FakeExtractor::new(vec![]));
        let orch = orchestrator(&dir, Arc::clone(&fetcher), Some(Arc::clone(&extractor)), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_refetches_despite_caches() {
        let unit = UnitKey::Year(800);
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        cache
            .put_processed("Chinese", &unit, &[candidate("stale", 800, 9)])
            .await
            .unwrap();

        let fetcher = Arc::new(FakeFetcher::new(vec![(unit.clone(), "fresh")]));
        let extractor = Arc::new(FakeExtractor::new(vec![(
            unit.clone(),
            vec![candidate("fresh event", 800, 9)],
        )]));
        let opts = RunOptions {
            force_refresh: true,
            ..options()
        };
        let orch = orchestrator(&dir, Arc::clone(&fetcher), Some(Arc::clone(&extractor)), opts).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(report.inserted, 1);
        // Both cache tiers overwritten.
        let cached = orch.cache.get_processed("Chinese", &unit).await.unwrap().unwrap();
        assert_eq!(cached[0].event_name.as_deref(), Some("fresh event"));
    }

    #[tokio::test]
    async fn test_fetch_failure_isolates_unit() {
        let good = UnitKey::Year(1900);
        let bad = UnitKey::Year(1905);
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            FakeFetcher::new(vec![(good.clone(), "page")]).failing_on(bad.clone()),
        );
        let extractor = Arc::new(FakeExtractor::new(vec![(
            good.clone(),
            vec![candidate("义和团运动", 1900, 8)],
        )]));
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&bad, false, &mut report).await;
        orch.process_unit(&good, false, &mut report).await;

        assert_eq!(report.failed_fetch, 1);
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_missing_page_is_not_a_failure() {
        let unit = UnitKey::Year(-999);
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(vec![]));
        let extractor = Arc::new(FakeExtractor::new(vec![]));
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.failed_fetch, 0);
        assert_eq!(report.candidates_seen(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_window_applies_across_units() {
        let first = UnitKey::Year(755);
        let second = UnitKey::Year(756);
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(vec![
            (first.clone(), "page"),
            (second.clone(), "page"),
        ]));
        let extractor = Arc::new(FakeExtractor::new(vec![
            (first.clone(), vec![candidate("安史之乱", 755, 9)]),
            (second.clone(), vec![candidate("安史之乱", 756, 9)]),
        ]));
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&first, false, &mut report).await;
        orch.process_unit(&second, false, &mut report).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_duplicate, 1);
    }

    #[tokio::test]
    async fn test_same_name_outside_window_is_not_a_duplicate() {
        let first = UnitKey::Year(1200);
        let second = UnitKey::Year(1210);
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(vec![
            (first.clone(), "page"),
            (second.clone(), "page"),
        ]));
        let extractor = Arc::new(FakeExtractor::new(vec![
            (first.clone(), vec![candidate("Battle of X", 1200, 7)]),
            (second.clone(), vec![candidate("Battle of X", 1210, 7)]),
        ]));
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&first, false, &mut report).await;
        orch.process_unit(&second, false, &mut report).await;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped_duplicate, 0);
    }

    #[tokio::test]
    async fn test_invalid_candidates_counted() {
        let unit = UnitKey::Year(100);
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(vec![(unit.clone(), "page")]));
        let nameless = CandidateEvent {
            start_year: Some(100),
            region: Some("Chinese".to_string()),
            ..CandidateEvent::default()
        };
        let extractor = Arc::new(FakeExtractor::new(vec![(unit.clone(), vec![nameless])]));
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.skipped_invalid, 1);
        assert_eq!(report.inserted, 0);
    }

    #[tokio::test]
    async fn test_degraded_mode_trusts_cached_candidates() {
        let unit = UnitKey::Year(1644);
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        // Importance 2 would fall below the threshold in strict mode.
        cache
            .put_processed("Chinese", &unit, &[candidate("清军入关", 1644, 2)])
            .await
            .unwrap();

        let fetcher = Arc::new(FakeFetcher::new(vec![]));
        let orch = orchestrator(&dir, fetcher, None, options()).await;

        let mut report = SweepReport::default();
        orch.process_unit(&unit, false, &mut report).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_below_threshold, 0);
    }

    #[tokio::test]
    async fn test_key_period_sweep_inserts_classified_period() {
        let dir = TempDir::new().unwrap();
        let name = "French Revolution".to_string();
        let fetcher = Arc::new(FakeFetcher::new(vec![(
            UnitKey::Entity(name.clone()),
            "revolution page",
        )]));
        let extractor = Arc::new(
            FakeExtractor::new(vec![]).with_period(CandidatePeriod {
                period_name: Some(name.clone()),
                start_year: Some(1789),
                end_year: Some(1799),
                region: Some("European".to_string()),
                ..CandidatePeriod::default()
            }),
        );
        let orch = orchestrator(&dir, fetcher, Some(extractor), options()).await;

        let report = orch.sweep_key_periods(&[name]).await;
        assert_eq!(report.periods_inserted, 1);

        let periods = orch
            .store
            .periods_in_range("European", 1790, 1795)
            .await
            .unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(
            periods[0].record.period_type,
            crate::models::PeriodType::Independent
        );
    }

    #[test]
    fn test_default_phases_cover_expected_years() {
        let phases = SamplingPhase::default_phases();
        assert_eq!(phases.len(), 6);

        let classical: Vec<i32> = phases[0].years().collect();
        assert_eq!(classical, vec![-1000, 0]);

        let twenty_first: Vec<i32> = phases[5].years().collect();
        assert_eq!(twenty_first.len(), 26);
        assert_eq!(twenty_first.first(), Some(&2001));
        assert_eq!(twenty_first.last(), Some(&2026));
    }

    #[test]
    fn test_default_terms_cover_all_eras() {
        let terms = default_civilization_terms();
        assert!(terms.iter().any(|t| t == "Ancient Greece"));
        assert!(terms.iter().any(|t| t == "Black Death"));
        assert!(terms.iter().any(|t| t == "Reformation"));
    }
}
