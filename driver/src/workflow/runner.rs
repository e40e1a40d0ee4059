use crate::pirep::row::PirepRow;
use crate::pirep::turbulence::{scale_turbulence, PlaneWeight};
use crate::sources::cache::ScanCache;
use crate::sources::file_time::{radar_file_time, radar_site};
use crate::sources::matching::{ScanArchive, SiteTable, NEAREST_SITES};
use crate::sources::scan_file::read_scan;
use crate::workflow::config::WorkflowConfig;
use crate::writer::{output_file_name, write_grid_file, GridAttributes, GridFile};
use anyhow::{ensure, Context};
use pirepgrid::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use pirepgrid::{create_grid, GateScan};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Written(PathBuf),
    /// No gate landed in any cell; nothing was written.
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub metrics: MetricsSnapshot,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    sites: Arc<SiteTable>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            sites: Arc::new(SiteTable::default()),
        }
    }

    /// Builds a runner and loads the configured site table, if any.
    pub fn from_config(config: WorkflowConfig) -> anyhow::Result<Self> {
        let sites = match &config.sites {
            Some(path) => SiteTable::load(path)?,
            None => SiteTable::default(),
        };
        LogManager::scoped("batch").detail(&format!("{} radar sites loaded", sites.len()));
        Ok(Self::new(config).with_sites(sites))
    }

    pub fn with_sites(mut self, sites: SiteTable) -> Self {
        self.sites = Arc::new(sites);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Grids one report against its nearest radar files and writes the result.
    pub fn execute_row(&self, row: &PirepRow, cache: &ScanCache) -> anyhow::Result<RowOutcome> {
        let radar_files = self.radar_files(row)?;
        ensure!(!radar_files.is_empty(), "row lists no radar files");
        let weight: PlaneWeight = row
            .plane_weight
            .parse()
            .context("parsing plane weight")?;
        let turb = scale_turbulence(row.turbulence_intensity, weight)
            .context("scaling turbulence intensity")?;

        let used = radar_files.len().min(self.config.max_radars.max(1));
        let files = &radar_files[..used];
        let scans = files
            .iter()
            .map(|path| cache.get_or_load(path, |path| self.load_scan(path)))
            .collect::<anyhow::Result<Vec<Arc<GateScan>>>>()?;
        let sites: Vec<&str> = files.iter().filter_map(|path| radar_site(path)).collect();
        LogManager::scoped(format!("row {}", row.id))
            .detail(&format!("gridding {} scans from {:?}", scans.len(), sites));

        let radar_time = radar_file_time(&files[0])
            .with_context(|| format!("reading scan time of {}", files[0].display()))?;
        let delta_t = (row.datetime - radar_time).num_seconds();

        let spec = self.config.grid.with_origin(row.origin());
        let scan_refs: Vec<&GateScan> = scans.iter().map(|scan| scan.as_ref()).collect();
        let outcome = create_grid(&scan_refs, &spec).context("gridding radar gates")?;
        let grid = match outcome.into_grid() {
            Some(grid) if grid.has_data() => grid,
            _ => return Ok(RowOutcome::NoData),
        };

        let attrs = GridAttributes {
            lat: row.lat,
            lon: row.lon,
            alt: row.flight_level_ft,
            delta_t,
            turb,
        };
        let path = write_grid_file(
            &self.config.output_dir,
            &output_file_name(row),
            &GridFile::from_grid(&grid, attrs),
        )?;
        Ok(RowOutcome::Written(path))
    }

    /// The row's own radar files, or a match from the archive when it has none.
    fn radar_files(&self, row: &PirepRow) -> anyhow::Result<Vec<PathBuf>> {
        if !row.radar_files.is_empty() {
            return Ok(row.radar_files.clone());
        }
        match &self.config.archive {
            Some(root) => ScanArchive::new(root)
                .match_row(row, &self.sites, NEAREST_SITES)
                .context("matching radar scans"),
            None => Ok(Vec::new()),
        }
    }

    fn load_scan(&self, path: &Path) -> anyhow::Result<GateScan> {
        let mut scan = read_scan(path, self.config.quality.as_ref())?;
        if scan.site_longitude == Some(0.0) {
            let code = radar_site(path)
                .with_context(|| format!("no site code in {}", path.display()))?;
            let site = self
                .sites
                .site(code)
                .with_context(|| format!("site {} missing from site table", code))?;
            scan.repair_longitude(site.lon);
        }
        Ok(scan)
    }

    /// Runs every row on a bounded pool of blocking workers.
    ///
    /// A failing row is logged and counted; it never stops the batch.
    pub fn run_batch(&self, rows: Vec<PirepRow>) -> anyhow::Result<BatchSummary> {
        let workers = self.config.workers.max(1);
        let runtime = TokioBuilder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .build()
            .context("creating batch runtime")?;

        let cache = Arc::new(ScanCache::with_capacity(self.config.cache_capacity));
        let metrics = Arc::new(MetricsRecorder::new());
        let batch = LogManager::scoped("batch");
        batch.record(&format!("gridding {} rows on {} workers", rows.len(), workers));

        runtime.block_on(async {
            let permits = Arc::new(Semaphore::new(workers));
            let mut handles = Vec::with_capacity(rows.len());
            for row in rows {
                let permit = permits
                    .clone()
                    .acquire_owned()
                    .await
                    .context("acquiring worker permit")?;
                let runner = self.clone();
                let cache = cache.clone();
                let metrics = metrics.clone();
                handles.push(tokio::task::spawn_blocking(move || {
                    let result = runner.execute_row(&row, &cache);
                    record_row(&row, &result, &metrics);
                    drop(permit);
                }));
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    batch.warn(&format!("row worker aborted: {}", err));
                    metrics.record_error();
                }
            }
            Ok::<(), anyhow::Error>(())
        })?;

        let (cache_hits, cache_misses) = cache.stats();
        batch.detail(&format!("scan cache holds {} scans", cache.len()));
        let summary = BatchSummary {
            metrics: metrics.snapshot(),
            cache_hits,
            cache_misses,
        };
        batch.record(&format!(
            "written {}, no data {}, failed {}",
            summary.metrics.written, summary.metrics.no_data, summary.metrics.failed
        ));
        Ok(summary)
    }
}

fn record_row(row: &PirepRow, result: &anyhow::Result<RowOutcome>, metrics: &MetricsRecorder) {
    let log = LogManager::scoped(format!("row {}", row.id));
    match result {
        Ok(RowOutcome::Written(path)) => {
            metrics.record_written();
            log.record(&format!("wrote {}", path.display()));
        }
        Ok(RowOutcome::NoData) => {
            metrics.record_no_data();
            log.record("no radar data in grid, skipped");
        }
        Err(err) => {
            metrics.record_error();
            log.warn(&format!("skipped: {:#}", err));
        }
    }
}
