use crate::error::LineCookError;
use crate::model::Prediction;
use tracing::{debug, info};

/// Distance from a box's aspect ratio to the nearest target ratio.
///
/// Lower is better. A zero height, or any ratio that is not finite, scores
/// `f64::INFINITY` so the box ranks below every well-formed candidate.
pub fn aspect_ratio_score(prediction: &Prediction, targets: (f64, f64)) -> f64 {
    if prediction.height == 0.0 {
        return f64::INFINITY;
    }
    let ratio = prediction.width / prediction.height;
    if !ratio.is_finite() {
        return f64::INFINITY;
    }
    let score = (ratio - targets.0).abs().min((ratio - targets.1).abs());
    if score.is_nan() {
        f64::INFINITY
    } else {
        score
    }
}

/// Pick the prediction whose aspect ratio best matches a shipping label.
///
/// Confidence is ignored. Ties go to the earliest prediction.
pub fn select_best(
    predictions: &[Prediction],
    targets: (f64, f64),
) -> Result<&Prediction, LineCookError> {
    let mut best: Option<(&Prediction, f64)> = None;

    for prediction in predictions {
        let score = aspect_ratio_score(prediction, targets);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((prediction, score)),
        }
    }

    let (winner, score) = best.ok_or(LineCookError::EmptyPredictionSet)?;
    info!("selected best prediction with aspect ratio score: {score:.3}");
    debug!(
        width = winner.width,
        height = winner.height,
        confidence = winner.confidence,
        "best prediction dimensions"
    );
    Ok(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TARGET_RATIOS;

    fn pred(width: f64, height: f64, confidence: f64) -> Prediction {
        Prediction::new(500.0, 500.0, width, height, confidence)
    }

    #[test]
    fn test_exact_portrait_match_beats_confidence() {
        let preds = vec![pred(1200.0, 1800.0, 0.9), pred(1800.0, 1200.0, 0.1)];
        let best = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert!(std::ptr::eq(best, &preds[0]));
    }

    #[test]
    fn test_confidence_not_used() {
        let preds = vec![pred(1000.0, 1000.0, 0.99), pred(400.0, 610.0, 0.05)];
        let best = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert_eq!(best.confidence, 0.05);
    }

    #[test]
    fn test_tie_goes_to_first() {
        let preds = vec![
            pred(600.0, 900.0, 0.2),
            pred(900.0, 600.0, 0.8),
            pred(400.0, 600.0, 0.9),
        ];
        let best = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert!(std::ptr::eq(best, &preds[0]));
    }

    #[test]
    fn test_zero_height_ranks_last() {
        let preds = vec![pred(100.0, 0.0, 1.0), pred(5000.0, 10.0, 0.1)];
        let best = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert!(std::ptr::eq(best, &preds[1]));
        assert_eq!(
            aspect_ratio_score(&preds[0], DEFAULT_TARGET_RATIOS),
            f64::INFINITY
        );
    }

    #[test]
    fn test_only_degenerate_predictions_returns_first() {
        let preds = vec![pred(100.0, 0.0, 0.3), pred(0.0, 0.0, 0.4)];
        let best = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert!(std::ptr::eq(best, &preds[0]));
    }

    #[test]
    fn test_empty_set_is_error() {
        let err = select_best(&[], DEFAULT_TARGET_RATIOS).unwrap_err();
        assert!(matches!(err, LineCookError::EmptyPredictionSet));
    }

    #[test]
    fn test_result_is_always_an_input_element() {
        let preds: Vec<Prediction> = (1..20)
            .map(|i| pred(i as f64 * 37.0, (21 - i) as f64 * 29.0, 0.5))
            .collect();
        let first = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        let second = select_best(&preds, DEFAULT_TARGET_RATIOS).unwrap();
        assert!(preds.iter().any(|p| std::ptr::eq(p, first)));
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_score_uses_nearest_target() {
        let landscape = pred(1800.0, 1200.0, 0.5);
        assert!(aspect_ratio_score(&landscape, DEFAULT_TARGET_RATIOS) < 1e-12);
        let square = pred(100.0, 100.0, 0.5);
        let expected = 1.0 - 4.0 / 6.0;
        assert!((aspect_ratio_score(&square, DEFAULT_TARGET_RATIOS) - expected).abs() < 1e-12);
    }
}
