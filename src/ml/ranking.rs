//! Feature ranking by absolute correlation with the target

use crate::ml::stats::pearson;
use crate::structs::{CrimeError, FeatureRanking, ModelFrame, RankedFeature, Result};
use log::{debug, warn};

/// Rank every predictor of the frame by |Pearson r| with the target
///
/// Ties keep the frame's column order. Zero-variance predictors are left out
/// and listed in [`FeatureRanking::degenerate`].
///
/// # Errors
/// Returns error if the target has zero variance or the frame has fewer than
/// 2 rows
pub fn rank_features(frame: &ModelFrame) -> Result<FeatureRanking> {
    let target = frame.target.to_vec();
    let mut entries = Vec::with_capacity(frame.features.n_features());
    let mut degenerate = Vec::new();

    for (name, column) in frame.features.names.iter().zip(frame.features.values.columns()) {
        match pearson(&column.to_vec(), &target, name, &frame.target_name) {
            Ok(r) => entries.push(RankedFeature {
                name: name.clone(),
                correlation: r,
                magnitude: r.abs(),
            }),
            Err(CrimeError::DegenerateFeature { column }) if column == *name => {
                degenerate.push(column);
            }
            Err(e) => return Err(e),
        }
    }

    if !degenerate.is_empty() {
        warn!(
            "Excluded {} zero-variance features from ranking: {}",
            degenerate.len(),
            degenerate.join(", ")
        );
    }

    // Vec::sort_by is stable
    entries.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    debug!("Ranked {} features against '{}'", entries.len(), frame.target_name);

    Ok(FeatureRanking {
        target: frame.target_name.clone(),
        entries,
        degenerate,
    })
}

impl FeatureRanking {
    /// Names of the `k` most correlated features (fewer if the ranking is shorter)
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<String> {
        self.entries.iter().take(k).map(|e| e.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
