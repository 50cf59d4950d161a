use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::acquisition::errors::AcquisitionError;
use crate::challenge::ChallengeSolver;
use crate::extractor::{ReadableDocument, extract_readable};
use crate::fetcher::{FingerprintedFetcher, PageResponse, validate_url};
use crate::repositories::EntryRepository;

/// Progress of one fetch through a possible challenge.
///
/// Each state is entered at most once, so a page can be solved at most once
/// per call.
enum ChallengeState {
    Initial,
    ChallengeDetected(PageResponse),
    Solved(String),
    Failed,
}

/// Fetches, cleans, and stores the readable body of an entry.
///
/// Cheap to share: all collaborators are behind `Arc`, and the only state
/// shared between concurrent calls is the fetcher's host cookie cache.
#[derive(Clone)]
pub struct AcquisitionPipeline {
    repo: Arc<dyn EntryRepository>,
    fetcher: Arc<FingerprintedFetcher>,
    solver: Arc<ChallengeSolver>,
}

impl AcquisitionPipeline {
    pub fn new(
        repo: Arc<dyn EntryRepository>,
        fetcher: Arc<FingerprintedFetcher>,
        solver: Arc<ChallengeSolver>,
    ) -> Self {
        Self {
            repo,
            fetcher,
            solver,
        }
    }

    /// Return the entry's readable HTML, fetching and storing it on first use.
    ///
    /// Content already stored is returned as is, without any network call.
    #[instrument(skip_all, fields(entry_id = entry_id))]
    pub async fn fetch_readable_content(
        &self,
        entry_id: i64,
        cancel: &CancellationToken,
    ) -> Result<String, AcquisitionError> {
        let entry = self.repo.get_by_id(entry_id).await?;

        if let Some(content) = entry.cached_content() {
            debug!("readable content already stored");
            return Ok(content.to_string());
        }

        let url = entry.source_url().ok_or_else(|| {
            AcquisitionError::InvalidInput(format!("entry {} has no source url", entry_id))
        })?;

        let page = self.fetch_through_challenge(url, cancel).await?;
        let document = self.extract(url, page, cancel).await?;

        let html = document.render();
        if html.is_empty() {
            return Err(AcquisitionError::InvalidInput(format!(
                "empty readable content for {}",
                url
            )));
        }

        if cancel.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }
        self.persist(entry_id, html).await
    }

    async fn fetch_through_challenge(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PageResponse, AcquisitionError> {
        let mut state = ChallengeState::Initial;

        loop {
            state = match state {
                ChallengeState::Initial => {
                    let page = self.fetcher.fetch(url, None, cancel).await?;
                    if !self.solver.is_challenge(&page.body_utf8) {
                        return Ok(page);
                    }
                    info!(url = %page.url_final, "challenge page detected");
                    ChallengeState::ChallengeDetected(page)
                }
                ChallengeState::ChallengeDetected(page) => {
                    let cookie = self
                        .solver
                        .solve_from_body(
                            cancel,
                            &page.body_utf8,
                            page.url_final.as_str(),
                            &page.cookies,
                        )
                        .await?;
                    ChallengeState::Solved(cookie)
                }
                ChallengeState::Solved(cookie) => {
                    // Pass the fresh cookie explicitly; the cache may already
                    // hold a newer or older one from a concurrent solve.
                    let page = self.fetcher.fetch(url, Some(&cookie), cancel).await?;
                    if !self.solver.is_challenge(&page.body_utf8) {
                        return Ok(page);
                    }
                    warn!(url = %page.url_final, "challenge served again after solving");
                    ChallengeState::Failed
                }
                ChallengeState::Failed => {
                    return Err(AcquisitionError::ChallengeUnsolvable(format!(
                        "{} still served a challenge after a solved retry",
                        url
                    )));
                }
            };
        }
    }

    /// Sanitize and extract on the blocking pool.
    async fn extract(
        &self,
        url: &str,
        page: PageResponse,
        cancel: &CancellationToken,
    ) -> Result<ReadableDocument, AcquisitionError> {
        let base_url = validate_url(url)?;
        let body = page.body_utf8;
        let task = tokio::task::spawn_blocking(move || extract_readable(&body, &base_url));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AcquisitionError::Cancelled),
            joined = task => {
                let document = joined.map_err(|e| {
                    AcquisitionError::InvalidInput(format!("extraction failed: {}", e))
                })??;
                Ok(document)
            }
        }
    }

    async fn persist(&self, entry_id: i64, html: String) -> Result<String, AcquisitionError> {
        if self.repo.update_readable_content(entry_id, &html).await? {
            info!(bytes = html.len(), "readable content stored");
            return Ok(html);
        }

        // Another writer stored content first; theirs stays.
        debug!("readable content was stored concurrently");
        let stored = self.repo.get_by_id(entry_id).await?;
        Ok(stored.cached_content().map(str::to_string).unwrap_or(html))
    }
}
