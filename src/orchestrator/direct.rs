//! Direct mode: wait for the artifact, fall back to upstream URLs once

use super::RetrievalOrchestrator;
use crate::error::{Error, Result};
use crate::extractor::RunMode;
use crate::job::Job;
use crate::types::{ArtifactDownload, DirectOutcome, RetrievalRequest, UrlListResponse};

impl RetrievalOrchestrator {
    /// Fetch the artifact for `request`, waiting for the job to finish
    ///
    /// When extraction fails the upstream URLs are resolved instead, exactly
    /// once. If that fails as well the result is [`Error::FallbackFailed`],
    /// which keeps the extraction failure as its source.
    pub async fn fetch_direct(&self, request: &RetrievalRequest) -> Result<DirectOutcome> {
        let _permit = self.admission.acquire().await?;

        let original = match self.extract(request).await {
            Ok(download) => return Ok(DirectOutcome::Artifact(download)),
            Err(e) if e.triggers_fallback() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            url = request.url(),
            error = %original,
            "direct extraction failed, resolving upstream URLs instead"
        );

        match self
            .extractor
            .resolve_urls(request, self.config.extractor.direct_timeout)
            .await
        {
            Ok(urls) => {
                tracing::info!(url = request.url(), count = urls.len(), "serving upstream URLs");
                Ok(DirectOutcome::Urls(UrlListResponse::new(
                    urls,
                    request.audio_only(),
                )))
            }
            Err(fallback) => {
                tracing::error!(
                    url = request.url(),
                    error = %original,
                    fallback_error = %fallback,
                    "download failed and URL fallback failed"
                );
                Err(Error::FallbackFailed {
                    original: Box::new(original),
                    fallback: fallback.to_string(),
                })
            }
        }
    }

    /// Run one job to completion and take its artifact
    async fn extract(&self, request: &RetrievalRequest) -> Result<ArtifactDownload> {
        let mut job = Job::start(
            self.extractor.as_ref(),
            &self.store,
            request,
            RunMode::Direct,
            self.config.extractor.direct_timeout,
        )
        .await?;

        let finished = tokio::select! {
            result = job.run_to_exit() => result,
            _ = self.admission.shutdown.cancelled() => {
                job.cancel();
                job.run_to_exit().await
            }
        };

        let bytes = match finished {
            Ok(path) => self.store.finalize(&path).await,
            Err(e) => Err(e),
        };
        job.release().await;

        Ok(ArtifactDownload {
            bytes: bytes?,
            content_type: request.kind().content_type(),
            filename: request.suggested_filename(),
        })
    }
}
