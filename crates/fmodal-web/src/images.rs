#![forbid(unsafe_code)]

//! Host-settled image preloading.
//!
//! [`WebImageLoader::preload`] only records what was asked for. The host
//! reports each URL's outcome with [`WebImageLoader::settle`] (or settles
//! everything at once), and a batch resolves when its last URL settles.
//! Outcomes are cached, so a URL that already settled never blocks again.
//! Batches whose completion was dropped are discarded unresolved.

use ahash::AHashMap;
use fmodal_backend::{ImageLoader, PreloadReport};
use fmodal_core::completion::{Completion, Resolver};

/// How an image load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageOutcome {
    Loaded,
    Failed,
}

#[derive(Debug)]
struct Batch {
    remaining: Vec<String>,
    report: PreloadReport,
    resolver: Resolver<PreloadReport>,
}

impl Batch {
    fn record(&mut self, outcome: ImageOutcome, count: usize) {
        match outcome {
            ImageOutcome::Loaded => self.report.loaded += count,
            ImageOutcome::Failed => self.report.failed += count,
        }
    }
}

/// Image loader whose loads are completed by the host.
#[derive(Debug, Default)]
pub struct WebImageLoader {
    batches: Vec<Batch>,
    settled: AHashMap<String, ImageOutcome>,
    requests: usize,
}

impl WebImageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop batches nobody waits on. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.batches.len();
        self.batches.retain(|batch| !batch.resolver.is_orphaned());
        before - self.batches.len()
    }

    /// URLs still waiting on the host, deduplicated, in request order.
    ///
    /// Batches whose completion was dropped are not counted.
    #[must_use]
    pub fn pending_urls(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let live = self.batches.iter().filter(|b| !b.resolver.is_orphaned());
        for url in live.flat_map(|b| b.remaining.iter()) {
            if !out.contains(url) {
                out.push(url.clone());
            }
        }
        out
    }

    /// Number of unresolved batches someone still waits on.
    #[must_use]
    pub fn pending_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| !b.resolver.is_orphaned())
            .count()
    }

    /// Total number of `preload` calls seen.
    #[must_use]
    pub const fn request_count(&self) -> usize {
        self.requests
    }

    /// Report the outcome for `url`. Returns how many batches resolved.
    pub fn settle(&mut self, url: &str, outcome: ImageOutcome) -> usize {
        self.settled.insert(url.to_owned(), outcome);
        self.prune();
        for batch in &mut self.batches {
            let before = batch.remaining.len();
            batch.remaining.retain(|pending| pending != url);
            let matched = before - batch.remaining.len();
            batch.record(outcome, matched);
        }
        let (done, waiting): (Vec<Batch>, Vec<Batch>) = std::mem::take(&mut self.batches)
            .into_iter()
            .partition(|batch| batch.remaining.is_empty());
        self.batches = waiting;
        let resolved = done.len();
        for batch in done {
            batch.resolver.resolve(batch.report);
        }
        resolved
    }

    /// Settle every pending URL with the same outcome.
    pub fn settle_all(&mut self, outcome: ImageOutcome) -> usize {
        self.pending_urls()
            .iter()
            .map(|url| self.settle(url, outcome))
            .sum()
    }
}

impl ImageLoader for WebImageLoader {
    fn preload(&mut self, urls: &[String]) -> Completion<PreloadReport> {
        self.requests += 1;
        self.prune();
        let (resolver, completion) = Completion::pending();
        let mut batch = Batch {
            remaining: Vec::new(),
            report: PreloadReport::default(),
            resolver,
        };
        for url in urls {
            match self.settled.get(url) {
                Some(outcome) => batch.record(*outcome, 1),
                None => batch.remaining.push(url.clone()),
            }
        }
        if batch.remaining.is_empty() {
            batch.resolver.resolve(batch.report);
        } else {
            self.batches.push(batch);
        }
        completion
    }
}
