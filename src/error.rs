use thiserror::Error;

/// Run-level error taxonomy.
///
/// Field-level parse failures never show up here: a price that does not
/// parse becomes `None` and a missing label becomes an empty string, both
/// handled where they occur.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The listing page never became interactive. Fatal for the run.
    #[error("listing page never became interactive: {0}")]
    PageLoad(anyhow::Error),

    /// A detail page could not be extracted within its retry budget.
    /// The URL is dropped and the run continues.
    #[error("giving up on {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// The dataset could not be written. Fatal for the run; the extracted
    /// records are still in memory so the merge can be retried externally.
    #[error("could not persist dataset to {path}: {cause}")]
    Persistence { path: String, cause: anyhow::Error },
}
