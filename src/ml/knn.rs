//! Brute-force k-nearest-neighbours regression

use crate::structs::{CrimeError, KnnParams, Metric, Result, Weighting};
use ndarray::{Array1, Array2, ArrayView1};

/// Training data memorised by a fitted KNN model
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    params: KnnParams,
    points: Array2<f64>,
    targets: Array1<f64>,
}

impl Metric {
    fn distance(self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            Self::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl KnnRegressor {
    /// Memorise the training set
    ///
    /// # Errors
    /// Returns a config error if `k` is zero
    pub fn fit(params: KnnParams, points: &Array2<f64>, targets: &Array1<f64>) -> Result<Self> {
        if params.k == 0 {
            return Err(CrimeError::Config("KNN needs k >= 1".into()));
        }
        Ok(Self {
            params,
            points: points.clone(),
            targets: targets.clone(),
        })
    }

    /// Predict every row of `queries`
    #[must_use]
    pub fn predict(&self, queries: &Array2<f64>) -> Array1<f64> {
        queries
            .rows()
            .into_iter()
            .map(|q| self.predict_one(q))
            .collect()
    }

    /// Indices and distances of the nearest training rows, closest first
    ///
    /// Equal distances are ordered by training-row index.
    #[must_use]
    pub fn neighbours(&self, query: ArrayView1<f64>) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = self
            .points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (i, self.params.metric.distance(query, p)))
            .collect();

        // Stable sort keeps index order among equal distances
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(self.params.k.min(self.points.nrows()));
        distances
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_one(&self, query: ArrayView1<f64>) -> f64 {
        let neighbours = self.neighbours(query);

        // Exact matches dominate: average the zero-distance neighbours only
        let exact: Vec<f64> = neighbours
            .iter()
            .filter(|(_, d)| *d == 0.0)
            .map(|&(i, _)| self.targets[i])
            .collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }

        match self.params.weighting {
            Weighting::Uniform => {
                neighbours.iter().map(|&(i, _)| self.targets[i]).sum::<f64>()
                    / neighbours.len() as f64
            }
            Weighting::Distance => {
                let (weighted, total) =
                    neighbours
                        .iter()
                        .fold((0.0, 0.0), |(weighted, total), &(i, d)| {
                            let w = 1.0 / d;
                            (weighted + w * self.targets[i], total + w)
                        });
                weighted / total
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(k: usize, weighting: Weighting) -> KnnParams {
        KnnParams {
            k,
            weighting,
            metric: Metric::Euclidean,
        }
    }

    fn line() -> (Array2<f64>, Array1<f64>) {
        (
            array![[0.0], [1.0], [2.0], [3.0], [10.0]],
            array![0.0, 10.0, 20.0, 30.0, 100.0],
        )
    }

    #[test]
    fn test_exact_match_returns_target() {
        let (x, y) = line();
        let model = KnnRegressor::fit(params(3, Weighting::Distance), &x, &y).expect("fit");

        let pred = model.predict(&array![[2.0], [10.0]]);
        assert!((pred[0] - 20.0).abs() < 1e-12);
        assert!((pred[1] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_exact_matches_average() {
        let x = array![[1.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let y = array![2.0, 4.0, 100.0];
        let model = KnnRegressor::fit(params(3, Weighting::Distance), &x, &y).expect("fit");

        let pred = model.predict(&array![[1.0, 1.0]]);
        assert!((pred[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_distance_weighting() {
        let (x, y) = line();
        let model = KnnRegressor::fit(params(2, Weighting::Distance), &x, &y).expect("fit");

        // Neighbours 1.0 (d=0.25) and 2.0 (d=0.75): weights 4 and 4/3
        let pred = model.predict(&array![[1.25]]);
        let expected = (4.0 * 10.0 + (4.0 / 3.0) * 20.0) / (4.0 + 4.0 / 3.0);
        assert!((pred[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_weighting() {
        let (x, y) = line();
        let model = KnnRegressor::fit(params(2, Weighting::Uniform), &x, &y).expect("fit");

        let pred = model.predict(&array![[1.25]]);
        assert!((pred[0] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_broken_by_training_order() {
        let x = array![[2.0], [0.0], [1.0]];
        let y = array![20.0, 0.0, 10.0];
        let model = KnnRegressor::fit(params(1, Weighting::Uniform), &x, &y).expect("fit");

        let nearest = model.neighbours(array![3.0].view());
        assert_eq!(nearest[0].0, 0);

        // 2.0 and 1.0 are both at distance 0.5 from the query
        let tie = model.neighbours(array![1.5].view());
        assert_eq!(tie[0].0, 0);
        assert!((model.predict(&array![[1.5]])[0] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_capped_at_training_size() {
        let (x, y) = line();
        let model = KnnRegressor::fit(params(50, Weighting::Uniform), &x, &y).expect("fit");

        assert_eq!(model.neighbours(array![0.5].view()).len(), 5);
        assert!((model.predict(&array![[0.5]])[0] - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_manhattan_metric() {
        let x = array![[0.0, 0.0], [3.0, 0.0]];
        let y = array![0.0, 1.0];
        let model = KnnRegressor::fit(
            KnnParams {
                k: 2,
                weighting: Weighting::Distance,
                metric: Metric::Manhattan,
            },
            &x,
            &y,
        )
        .expect("fit");

        // Manhattan distances 2 and 3: weights 1/2 and 1/3
        let pred = model.predict(&array![[1.0, 1.0]]);
        let expected = (1.0 / 3.0) / (0.5 + 1.0 / 3.0);
        assert!((pred[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_k_rejected() {
        let (x, y) = line();
        assert!(matches!(
            KnnRegressor::fit(params(0, Weighting::Distance), &x, &y),
            Err(CrimeError::Config(_))
        ));
    }
}
