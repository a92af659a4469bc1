use crate::config::{PageFailurePolicy, PipelineSettings, ScanPolicy};
use crate::error::LineCookError;
use crate::extract::extract;
use crate::inference::InferenceClient;
use crate::model::{Page, PipelineResult, Prediction, SourceKind};
use crate::select::{aspect_ratio_score, select_best};
use tracing::{debug, info, warn};

/// Reason reported when no page yields a detection.
pub fn not_found_reason(kind: SourceKind) -> String {
    format!("No shipping labels detected in {kind}")
}

/// Scan pages in order and turn the winning prediction into a label.
///
/// With [`ScanPolicy::FirstMatch`] the scan stops at the first page that has
/// any detection; later pages are never sent for inference, even if they
/// might hold a better-shaped box.
pub fn scan_pages(
    pages: &[Page],
    kind: SourceKind,
    settings: &PipelineSettings,
    client: &dyn InferenceClient,
) -> Result<PipelineResult, LineCookError> {
    let mut failed_pages = 0usize;
    let mut last_failure: Option<LineCookError> = None;
    let mut best_so_far: Option<(&Page, Prediction, f64)> = None;

    for page in pages {
        let set = match client.infer(page) {
            Ok(set) => set,
            Err(err) if settings.page_failure_policy == PageFailurePolicy::SkipPage => {
                warn!(
                    page = %page.description,
                    backend = client.backend_name(),
                    error = %err,
                    "inference failed, skipping page"
                );
                failed_pages += 1;
                last_failure = Some(err);
                continue;
            }
            Err(err) => return Err(err),
        };

        if set.is_empty() {
            debug!(page = %page.description, "no labels detected");
            continue;
        }

        let best = select_best(&set.predictions, settings.target_ratios)?;

        match settings.scan_policy {
            ScanPolicy::FirstMatch => return found(page, best),
            ScanPolicy::BestAcrossAllPages => {
                let score = aspect_ratio_score(best, settings.target_ratios);
                let improves = match &best_so_far {
                    Some((_, _, best_score)) => score < *best_score,
                    None => true,
                };
                if improves {
                    best_so_far = Some((page, best.clone(), score));
                }
            }
        }
    }

    if let Some((page, prediction, _)) = best_so_far {
        return found(page, &prediction);
    }

    // Every page failed: that is an inference failure, not an empty document.
    if failed_pages > 0 && failed_pages == pages.len() {
        if let Some(err) = last_failure {
            return Err(err);
        }
    }

    let reason = not_found_reason(kind);
    info!("{reason}");
    Ok(PipelineResult::NotFound { reason })
}

fn found(page: &Page, prediction: &Prediction) -> Result<PipelineResult, LineCookError> {
    let label = extract(page, prediction)?;
    info!(page = %page.description, "successfully processed");
    Ok(PipelineResult::Found(label))
}
