// Copyright (C) 2024  Johannes Kepler University Linz, Institute of Networks and Security
// Copyright (C) 2024  CDL Digidow <https://www.digidow.eu/>
//
// Licensed under the EUPL, Version 1.2 or – as soon they will be approved by
// the European Commission - subsequent versions of the EUPL (the "Licence").
// You may not use this work except in compliance with the Licence.
//
// You should have received a copy of the European Union Public License along
// with this program.  If not, you may obtain a copy of the Licence at:
// <https://joinup.ec.europa.eu/software/page/eupl>
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the Licence is distributed on an "AS IS" basis,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the Licence for the specific language governing permissions and
// limitations under the Licence.

//! Threshold sweeps over classifier scores: ROC and precision-recall curves.

use itertools::Itertools;
use serde::Serialize;

use crate::confusion::ConfusionMatrix;
use crate::error::{check_paired, Error, Result};

/// Scores of a classifier, split by the true class of each sample. Both halves are kept sorted
/// ascending.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    positives: Vec<f64>,
    negatives: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub threshold: f64,
    /// 1 - specificity
    pub fpr: f64,
    /// sensitivity
    pub tpr: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    /// Starts at (0, 0) with an infinite threshold, then one point per distinct score
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrCurve {
    /// Starts at recall 0 / precision 1 with an infinite threshold, then one point per distinct
    /// score
    pub points: Vec<PrPoint>,
    /// Trapezoidal area over (recall, precision)
    pub auc: f64,
    /// Step-wise area: sum of precision weighted by each recall increase
    pub average_precision: f64,
}

fn check_score(score: f64) -> Result<f64> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(Error::InvalidInput(format!("score {score} is not finite")))
    }
}

fn insert_sorted(scores: &mut Vec<f64>, score: f64) {
    let idx = scores.partition_point(|x| *x <= score);
    scores.insert(idx, score);
}

/// Number of entries of the ascending `scores` that are `>= threshold`.
fn count_at_least(scores: &[f64], threshold: f64) -> usize {
    scores.len() - scores.partition_point(|x| *x < threshold)
}

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs every score with its label.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if the vectors are empty, differ in length or a score is NaN or
    /// infinite
    pub fn from_scores(scores: &[f64], labels: &[bool]) -> Result<Self> {
        check_paired(labels, scores, "score")?;

        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        for (&score, &label) in scores.iter().zip(labels) {
            let score = check_score(score)?;
            if label {
                positives.push(score);
            } else {
                negatives.push(score);
            }
        }
        positives.sort_by(f64::total_cmp);
        negatives.sort_by(f64::total_cmp);

        log::debug!(
            "Collected {} positive and {} negative scores",
            positives.len(),
            negatives.len()
        );
        Ok(Self {
            positives,
            negatives,
        })
    }

    /// Adds the score of a sample whose true class is positive.
    pub fn add_positive(&mut self, score: f64) -> Result<()> {
        insert_sorted(&mut self.positives, check_score(score)?);
        Ok(())
    }

    /// Adds the score of a sample whose true class is negative.
    pub fn add_negative(&mut self, score: f64) -> Result<()> {
        insert_sorted(&mut self.negatives, check_score(score)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.positives.len() + self.negatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All distinct scores, highest first
    pub fn thresholds(&self) -> Vec<f64> {
        let mut thresholds: Vec<f64> = self
            .positives
            .iter()
            .merge(self.negatives.iter())
            .copied()
            .dedup()
            .collect();
        thresholds.reverse();
        thresholds
    }

    pub fn confusion_at(&self, threshold: f64) -> ConfusionMatrix {
        let tp = count_at_least(&self.positives, threshold);
        let fp = count_at_least(&self.negatives, threshold);
        ConfusionMatrix::from_counts(
            tp,
            fp,
            self.negatives.len() - fp,
            self.positives.len() - tp,
        )
    }

    /// Threshold with the fewest errors (FP + FN). On ties the lowest threshold wins.
    ///
    /// Returns `None` for an empty set.
    pub fn best_threshold(&self) -> Option<(f64, ConfusionMatrix)> {
        self.thresholds()
            .into_iter()
            .rev()
            .map(|threshold| (threshold, self.confusion_at(threshold)))
            .min_by_key(|(_, cm)| cm.amount_false())
    }

    /// ROC curve over every distinct score.
    ///
    /// # Errors
    /// - `Error::UndefinedMetric` if one of the classes has no samples, as sensitivity or
    /// specificity would be undefined at every threshold
    pub fn roc(&self) -> Result<RocCurve> {
        if self.positives.is_empty() {
            return Err(Error::UndefinedMetric("sensitivity"));
        }
        if self.negatives.is_empty() {
            return Err(Error::UndefinedMetric("specificity"));
        }

        let mut points = vec![RocPoint {
            threshold: f64::INFINITY,
            fpr: 0.,
            tpr: 0.,
        }];
        for threshold in self.thresholds() {
            let cm = self.confusion_at(threshold);
            points.push(RocPoint {
                threshold,
                fpr: cm.false_positive_rate().required("specificity")?,
                tpr: cm.sensitivity().required("sensitivity")?,
            });
        }

        let auc = trapezoid(points.iter().map(|p| (p.fpr, p.tpr)));
        log::debug!("ROC curve with {} points, auc {auc}", points.len());
        Ok(RocCurve { points, auc })
    }

    /// Precision-recall curve over every distinct score.
    ///
    /// # Errors
    /// - `Error::UndefinedMetric` if there are no positive samples
    pub fn precision_recall(&self) -> Result<PrCurve> {
        if self.positives.is_empty() {
            return Err(Error::UndefinedMetric("sensitivity"));
        }

        let mut points = vec![PrPoint {
            threshold: f64::INFINITY,
            precision: 1.,
            recall: 0.,
        }];
        for threshold in self.thresholds() {
            let cm = self.confusion_at(threshold);
            points.push(PrPoint {
                threshold,
                // at least the sample scoring `threshold` is predicted positive
                precision: cm.ppv().required("ppv")?,
                recall: cm.sensitivity().required("sensitivity")?,
            });
        }

        let average_precision = points
            .iter()
            .tuple_windows()
            .map(|(prev, cur)| (cur.recall - prev.recall) * cur.precision)
            .sum();
        let auc = trapezoid(points.iter().map(|p| (p.recall, p.precision)));
        Ok(PrCurve {
            points,
            auc,
            average_precision,
        })
    }
}

/// Area under a polyline by the trapezoidal rule. Points are sorted by `x` ascending first.
pub fn trapezoid(points: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    points
        .into_iter()
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .tuple_windows()
        .map(|((x0, y0), (x1, y1))| (x1 - x0) * (y0 + y1) / 2.)
        .sum()
}

pub fn roc_curve(scores: &[f64], labels: &[bool]) -> Result<RocCurve> {
    ScoreSet::from_scores(scores, labels)?.roc()
}

pub fn pr_curve(scores: &[f64], labels: &[bool]) -> Result<PrCurve> {
    ScoreSet::from_scores(scores, labels)?.precision_recall()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> ScoreSet {
        ScoreSet::from_scores(&[0.1, 0.4, 0.35, 0.8], &[false, false, true, true]).unwrap()
    }

    #[test]
    fn thresholds_descending_and_distinct() {
        let set =
            ScoreSet::from_scores(&[0.3, 0.9, 0.3, 0.1], &[true, false, false, true]).unwrap();
        assert_eq!(set.thresholds(), vec![0.9, 0.3, 0.1]);
    }

    #[test]
    fn roc_of_textbook_example() {
        let roc = sample().roc().unwrap();
        let xy: Vec<_> = roc.points.iter().map(|p| (p.fpr, p.tpr)).collect();
        assert_eq!(xy, vec![(0., 0.), (0., 0.5), (0.5, 0.5), (0.5, 1.), (1., 1.)]);
        assert_abs_diff_eq!(roc.auc, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn pr_of_textbook_example() {
        let pr = sample().precision_recall().unwrap();
        assert_eq!(pr.points.len(), 5);
        assert_eq!(pr.points[1].precision, 1.0);
        assert_eq!(pr.points[1].recall, 0.5);
        assert_abs_diff_eq!(pr.points[3].precision, 2. / 3., epsilon = 1e-12);
        assert_abs_diff_eq!(pr.average_precision, 0.5 + 0.5 * 2. / 3., epsilon = 1e-12);
        assert!(pr.auc > 0. && pr.auc <= 1.);
    }

    #[test]
    fn perfect_separation() {
        let roc = roc_curve(&[0.9, 0.8, 0.2, 0.1], &[true, true, false, false]).unwrap();
        assert_abs_diff_eq!(roc.auc, 1.0, epsilon = 1e-12);
        let pr = pr_curve(&[0.9, 0.8, 0.2, 0.1], &[true, true, false, false]).unwrap();
        assert_abs_diff_eq!(pr.average_precision, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_class_is_undefined() {
        let only_neg = ScoreSet::from_scores(&[0.1, 0.2], &[false, false]).unwrap();
        assert!(matches!(only_neg.roc(), Err(Error::UndefinedMetric("sensitivity"))));
        assert!(only_neg.precision_recall().is_err());

        let only_pos = ScoreSet::from_scores(&[0.1, 0.2], &[true, true]).unwrap();
        assert!(matches!(only_pos.roc(), Err(Error::UndefinedMetric("specificity"))));
        assert!(only_pos.precision_recall().is_ok());
    }

    #[test]
    fn rejects_bad_scores() {
        assert!(ScoreSet::from_scores(&[f64::NAN], &[true]).is_err());
        assert!(ScoreSet::from_scores(&[0.1], &[true, false]).is_err());
        assert!(ScoreSet::new().add_positive(f64::INFINITY).is_err());
    }

    #[test]
    fn incremental_matches_bulk() {
        let mut set = ScoreSet::new();
        set.add_negative(0.4).unwrap();
        set.add_positive(0.8).unwrap();
        set.add_negative(0.1).unwrap();
        set.add_positive(0.35).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.thresholds(), sample().thresholds());
        assert_eq!(set.confusion_at(0.35), sample().confusion_at(0.35));
    }

    #[test]
    fn best_threshold_minimizes_errors() {
        let (threshold, cm) = sample().best_threshold().unwrap();
        assert_eq!(cm.amount_false(), 1);
        assert_eq!(threshold, 0.35);
        assert!(ScoreSet::new().best_threshold().is_none());
    }

    #[test]
    fn trapezoid_sorts_points() {
        let area = trapezoid(vec![(1., 1.), (0., 0.), (0.5, 0.5)]);
        assert_abs_diff_eq!(area, 0.5, epsilon = 1e-12);
    }
}
