#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gist::{
    acquisition::AcquisitionPipeline,
    challenge::{ChallengeSolver, SolverConfig},
    entities::Entry,
    fetcher::{FetchConfig, FingerprintedFetcher, HostChallengeCache},
    repositories::{EntryRepository, RepositoryError},
};

pub const ACCESS_COOKIE: &str = "techaro.lol-anubis-auth=token123";
pub const SEED_COOKIE: &str = "within.website-x-cmd-anubis-cookie-verification=seed42";

/// Entry store kept in memory, counting successful writes.
#[derive(Default)]
pub struct InMemoryEntryRepository {
    entries: Mutex<HashMap<i64, Entry>>,
    writes: AtomicUsize,
}

impl InMemoryEntryRepository {
    pub fn with_entry(id: i64, url: &str) -> Self {
        let repo = Self::default();
        repo.insert(Entry {
            id,
            url: Some(url.to_string()),
            readable_content: None,
        });
        repo
    }

    pub fn insert(&self, entry: Entry) {
        self.entries.lock().unwrap().insert(entry.id, entry);
    }

    pub fn stored(&self, id: i64) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|entry| entry.readable_content.clone())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn get_by_id(&self, id: i64) -> Result<Entry, RepositoryError> {
        self.entries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_readable_content(&self, id: i64, html: &str) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        if entry.cached_content().is_some() {
            return Ok(false);
        }
        entry.readable_content = Some(html.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_missing_readable(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>, RepositoryError> {
        let entries = self.entries.lock().unwrap();
        let mut ids: Vec<i64> = entries
            .values()
            .filter(|entry| entry.id > after_id)
            .filter(|entry| entry.source_url().is_some() && entry.cached_content().is_none())
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids.truncate(limit as usize);
        Ok(ids)
    }
}

pub struct Stack {
    pub cache: Arc<HostChallengeCache>,
    pub fetcher: Arc<FingerprintedFetcher>,
    pub solver: Arc<ChallengeSolver>,
}

pub fn stack() -> Stack {
    let cache = Arc::new(HostChallengeCache::new());
    let fetcher = Arc::new(FingerprintedFetcher::new(FetchConfig::default(), cache.clone()).unwrap());
    let solver = Arc::new(ChallengeSolver::new(fetcher.clone(), SolverConfig::default()));
    Stack {
        cache,
        fetcher,
        solver,
    }
}

pub fn pipeline(repo: Arc<InMemoryEntryRepository>, stack: &Stack) -> AcquisitionPipeline {
    AcquisitionPipeline::new(repo, stack.fetcher.clone(), stack.solver.clone())
}

/// Anubis challenge page using the legacy string seed.
pub fn challenge_page(seed: &str, difficulty: u32) -> String {
    format!(
        r#"<!doctype html><html><head><title>Making sure you're not a bot!</title></head>
<body><h1>Making sure you're not a bot!</h1>
<script id="anubis_challenge" type="application/json">{{"challenge":"{}","rules":{{"algorithm":"fast","difficulty":{},"report_as":{}}}}}</script>
<script id="anubis_base_prefix" type="application/json">""</script>
</body></html>"#,
        seed, difficulty, difficulty
    )
}

pub fn article_page(marker: &str) -> String {
    format!(
        r#"<!doctype html><html><head><title>{marker} - Example Times</title></head><body>
<nav><a href="/">Home</a></nav>
<article><p>{body}</p><p>Read <a href="/more">more coverage</a> of {marker}.</p></article>
<script>track()</script>
</body></html>"#,
        marker = marker,
        body = "This report covers the day's events in enough detail to be the main content. "
            .repeat(8)
    )
}
