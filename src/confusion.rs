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

use serde::Serialize;

use crate::error::{check_paired, Error, Result};
use crate::metric::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Counts of a binary classification, computed from paired label and prediction vectors.
///
/// All metrics are recomputed from these four counts on every call.
pub struct ConfusionMatrix {
    /// true-positives
    pub tp: usize,

    /// false-positives
    pub fp: usize,

    /// true-negatives
    pub tn: usize,

    /// false-negatives
    pub fne: usize,
}

impl ConfusionMatrix {
    pub fn from_counts(tp: usize, fp: usize, tn: usize, fne: usize) -> Self {
        Self { tp, fp, tn, fne }
    }

    /// Counts `labels` against `predictions`, index by index. Everything equal to `positive` is
    /// the positive class, everything else negative.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if the vectors are empty or differ in length
    pub fn from_labels<T: PartialEq>(
        labels: &[T],
        predictions: &[T],
        positive: &T,
    ) -> Result<Self> {
        check_paired(labels, predictions, "prediction")?;

        let mut cm = Self::default();
        for (actual, predicted) in labels.iter().zip(predictions) {
            cm.count(actual == positive, predicted == positive);
        }
        Ok(cm)
    }

    /// Same as `from_labels`, for `0/1` vectors with `1` as positive class.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if the vectors are empty, differ in length or contain other values
    pub fn from_binary(labels: &[u8], predictions: &[u8]) -> Result<Self> {
        if let Some(v) = labels.iter().chain(predictions).find(|v| **v > 1) {
            return Err(Error::InvalidInput(format!("expected 0 or 1, got {v}")));
        }
        Self::from_labels(labels, predictions, &1)
    }

    pub fn from_bools(labels: &[bool], predictions: &[bool]) -> Result<Self> {
        Self::from_labels(labels, predictions, &true)
    }

    /// Binarizes scores at `threshold`: a score `>= threshold` is predicted positive.
    pub fn at_threshold<T: PartialOrd>(threshold: T, positives: &[T], negatives: &[T]) -> Self {
        let tp = positives.iter().filter(|x| **x >= threshold).count();
        let fne = positives.len() - tp;
        let fp = negatives.iter().filter(|x| **x >= threshold).count();
        let tn = negatives.len() - fp;
        Self { tp, fp, tn, fne }
    }

    fn count(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.tp += 1,
            (true, false) => self.fne += 1,
            (false, true) => self.fp += 1,
            (false, false) => self.tn += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fne
    }

    pub fn actual_positive(&self) -> usize {
        self.tp + self.fne
    }

    pub fn actual_negative(&self) -> usize {
        self.tn + self.fp
    }

    pub fn predicted_positive(&self) -> usize {
        self.tp + self.fp
    }

    pub fn predicted_negative(&self) -> usize {
        self.tn + self.fne
    }

    pub fn amount_false(&self) -> usize {
        self.fne + self.fp
    }

    /// TP / (TP + FN), also called recall or true positive rate
    pub fn sensitivity(&self) -> Metric {
        Metric::from_counts(self.tp, self.actual_positive())
    }

    /// TN / (TN + FP), also called true negative rate
    pub fn specificity(&self) -> Metric {
        Metric::from_counts(self.tn, self.actual_negative())
    }

    /// TP / (TP + FP), also called precision
    pub fn ppv(&self) -> Metric {
        Metric::from_counts(self.tp, self.predicted_positive())
    }

    /// TN / (TN + FN)
    pub fn npv(&self) -> Metric {
        Metric::from_counts(self.tn, self.predicted_negative())
    }

    pub fn false_positive_rate(&self) -> Metric {
        Metric::from_counts(self.fp, self.actual_negative())
    }

    pub fn false_negative_rate(&self) -> Metric {
        Metric::from_counts(self.fne, self.actual_positive())
    }

    pub fn false_discovery_rate(&self) -> Metric {
        Metric::from_counts(self.fp, self.predicted_positive())
    }

    pub fn false_omission_rate(&self) -> Metric {
        Metric::from_counts(self.fne, self.predicted_negative())
    }

    pub fn accuracy(&self) -> Metric {
        Metric::from_counts(self.tp + self.tn, self.total())
    }

    /// Mean of sensitivity and specificity
    pub fn balanced_accuracy(&self) -> Metric {
        self.sensitivity()
            .zip_with(self.specificity(), |sens, spec| (sens + spec) / 2.0)
    }

    pub fn f1(&self) -> Metric {
        Metric::from_counts(2 * self.tp, 2 * self.tp + self.fp + self.fne)
    }

    /// Sensitivity + specificity - 1
    pub fn youden_j(&self) -> Metric {
        self.sensitivity()
            .zip_with(self.specificity(), |sens, spec| sens + spec - 1.0)
    }

    /// Matthews correlation coefficient in `[-1, 1]`. Zero if any marginal is empty.
    pub fn matthews_corrcoef(&self) -> f64 {
        let (tp, fp, tn, fne) = (
            self.tp as f64,
            self.fp as f64,
            self.tn as f64,
            self.fne as f64,
        );
        let den = ((tp + fp) * (tp + fne) * (tn + fp) * (tn + fne)).sqrt();
        if den == 0.0 {
            0.0
        } else {
            (tp * tn - fp * fne) / den
        }
    }

    /// LR+ = sensitivity / (1 - specificity). Undefined for a classifier without false positives.
    pub fn positive_likelihood_ratio(&self) -> Metric {
        self.sensitivity()
            .divide(self.specificity().map(|spec| 1.0 - spec))
    }

    /// LR- = (1 - sensitivity) / specificity
    pub fn negative_likelihood_ratio(&self) -> Metric {
        self.sensitivity()
            .map(|sens| 1.0 - sens)
            .divide(self.specificity())
    }

    /// LR+ / LR-
    pub fn diagnostic_odds_ratio(&self) -> Metric {
        self.positive_likelihood_ratio()
            .divide(self.negative_likelihood_ratio())
    }

    /// Observed fraction of positive labels
    pub fn prevalence(&self) -> Metric {
        Metric::from_counts(self.actual_positive(), self.total())
    }

    /// prevalence / (1 - prevalence)
    pub fn pre_test_odds(&self) -> Metric {
        let prevalence = self.prevalence();
        prevalence.divide(prevalence.map(|p| 1.0 - p))
    }

    /// Odds of being positive after a positive prediction: pre-test odds * LR+
    pub fn post_test_odds(&self) -> Metric {
        self.pre_test_odds()
            .zip_with(self.positive_likelihood_ratio(), |odds, lr| odds * lr)
    }

    /// Probability of being positive after a positive prediction. Agrees with `ppv` whenever both
    /// are defined.
    pub fn post_test_probability(&self) -> Metric {
        self.post_test_odds().map(odds_to_probability)
    }

    /// Odds of being positive after a negative prediction: pre-test odds * LR-
    pub fn post_test_odds_negative(&self) -> Metric {
        self.pre_test_odds()
            .zip_with(self.negative_likelihood_ratio(), |odds, lr| odds * lr)
    }

    /// Probability of being positive after a negative prediction. Agrees with `1 - npv`.
    pub fn post_test_probability_negative(&self) -> Metric {
        self.post_test_odds_negative().map(odds_to_probability)
    }

    /// PPV the same sensitivity and specificity would give in a population with `prevalence`.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if `prevalence` is outside `[0, 1]`
    pub fn ppv_at_prevalence(&self, prevalence: f64) -> Result<Metric> {
        check_probability(prevalence)?;
        let hits = self.sensitivity().map(|sens| sens * prevalence);
        let false_alarms = self
            .false_positive_rate()
            .map(|fpr| fpr * (1.0 - prevalence));
        Ok(hits.divide(hits.zip_with(false_alarms, |a, b| a + b)))
    }

    /// NPV the same sensitivity and specificity would give in a population with `prevalence`.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if `prevalence` is outside `[0, 1]`
    pub fn npv_at_prevalence(&self, prevalence: f64) -> Result<Metric> {
        check_probability(prevalence)?;
        let rejections = self.specificity().map(|spec| spec * (1.0 - prevalence));
        let misses = self.false_negative_rate().map(|fnr| fnr * prevalence);
        Ok(rejections.divide(rejections.zip_with(misses, |a, b| a + b)))
    }

    pub fn report(&self) -> Report {
        Report {
            confusion: *self,
            accuracy: self.accuracy(),
            sensitivity: self.sensitivity(),
            specificity: self.specificity(),
            ppv: self.ppv(),
            npv: self.npv(),
            balanced_accuracy: self.balanced_accuracy(),
            f1: self.f1(),
            matthews_corrcoef: self.matthews_corrcoef(),
            positive_likelihood_ratio: self.positive_likelihood_ratio(),
            negative_likelihood_ratio: self.negative_likelihood_ratio(),
            diagnostic_odds_ratio: self.diagnostic_odds_ratio(),
            prevalence: self.prevalence(),
            pre_test_odds: self.pre_test_odds(),
            post_test_odds: self.post_test_odds(),
            post_test_probability: self.post_test_probability(),
        }
    }
}

fn odds_to_probability(odds: f64) -> f64 {
    odds / (1. + odds)
}

fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("prevalence {p} not in [0, 1]")))
    }
}

#[derive(Debug, Clone, Serialize)]
/// Snapshot of every metric of one confusion matrix
pub struct Report {
    pub confusion: ConfusionMatrix,
    pub accuracy: Metric,
    pub sensitivity: Metric,
    pub specificity: Metric,
    pub ppv: Metric,
    pub npv: Metric,
    pub balanced_accuracy: Metric,
    pub f1: Metric,
    pub matthews_corrcoef: f64,
    pub positive_likelihood_ratio: Metric,
    pub negative_likelihood_ratio: Metric,
    pub diagnostic_odds_ratio: Metric,
    pub prevalence: Metric,
    pub pre_test_odds: Metric,
    pub post_test_odds: Metric,
    pub post_test_probability: Metric,
}

impl Report {
    /// `name;value` pairs in a fixed order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tp", self.confusion.tp.to_string()),
            ("fp", self.confusion.fp.to_string()),
            ("tn", self.confusion.tn.to_string()),
            ("fn", self.confusion.fne.to_string()),
            ("accuracy", self.accuracy.to_string()),
            ("sensitivity", self.sensitivity.to_string()),
            ("specificity", self.specificity.to_string()),
            ("ppv", self.ppv.to_string()),
            ("npv", self.npv.to_string()),
            ("balanced_accuracy", self.balanced_accuracy.to_string()),
            ("f1", self.f1.to_string()),
            ("mcc", self.matthews_corrcoef.to_string()),
            ("lr+", self.positive_likelihood_ratio.to_string()),
            ("lr-", self.negative_likelihood_ratio.to_string()),
            ("dor", self.diagnostic_odds_ratio.to_string()),
            ("prevalence", self.prevalence.to_string()),
            ("pre_test_odds", self.pre_test_odds.to_string()),
            ("post_test_odds", self.post_test_odds.to_string()),
            ("post_test_probability", self.post_test_probability.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn example() -> ConfusionMatrix {
        let labels = [1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let predictions = [1, 0, 1, 0, 0, 0, 1, 0, 0, 0];
        ConfusionMatrix::from_binary(&labels, &predictions).unwrap()
    }

    fn get(m: Metric) -> f64 {
        m.value().unwrap()
    }

    #[test]
    fn counts_from_binary() {
        assert_eq!(example(), ConfusionMatrix::from_counts(2, 1, 6, 1));
        assert_eq!(example().total(), 10);
    }

    #[test]
    fn worked_example() {
        let cm = example();
        assert_abs_diff_eq!(get(cm.sensitivity()), 2. / 3., epsilon = 1e-12);
        assert_abs_diff_eq!(get(cm.specificity()), 6. / 7., epsilon = 1e-12);
        assert_abs_diff_eq!(get(cm.positive_likelihood_ratio()), 14. / 3., epsilon = 1e-9);
        assert_abs_diff_eq!(get(cm.pre_test_odds()), 3. / 7., epsilon = 1e-12);
        assert_abs_diff_eq!(get(cm.post_test_odds()), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(get(cm.post_test_probability()), 2. / 3., epsilon = 1e-9);
        assert_abs_diff_eq!(get(cm.ppv()), 2. / 3., epsilon = 1e-12);
        assert_abs_diff_eq!(get(cm.npv()), 6. / 7., epsilon = 1e-12);
        assert_abs_diff_eq!(get(cm.accuracy()), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn negative_post_test_matches_npv() {
        let cm = example();
        let expected = 1.0 - get(cm.npv());
        assert_abs_diff_eq!(get(cm.post_test_probability_negative()), expected, epsilon = 1e-9);
    }

    #[test]
    fn no_positives() {
        let cm = ConfusionMatrix::from_binary(&[0, 0, 0], &[0, 1, 0]).unwrap();
        assert_eq!(cm.sensitivity(), Metric::Undefined);
        assert_eq!(cm.positive_likelihood_ratio(), Metric::Undefined);
        assert_eq!(cm.negative_likelihood_ratio(), Metric::Undefined);
        assert!(cm.specificity().is_defined());
        assert!(cm.npv().is_defined());
    }

    #[test]
    fn zero_specificity_leaves_lr_minus_undefined() {
        let cm = ConfusionMatrix::from_counts(2, 3, 0, 1);
        assert_eq!(get(cm.specificity()), 0.0);
        assert_eq!(cm.negative_likelihood_ratio(), Metric::Undefined);
        assert_eq!(cm.diagnostic_odds_ratio(), Metric::Undefined);
        assert!(cm.positive_likelihood_ratio().is_defined());
    }

    #[test]
    fn no_predicted_positives_leaves_ppv_undefined() {
        let cm = ConfusionMatrix::from_counts(0, 0, 3, 2);
        assert_eq!(cm.ppv(), Metric::Undefined);
        assert_eq!(cm.false_discovery_rate(), Metric::Undefined);
        assert_abs_diff_eq!(get(cm.npv()), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn no_predicted_negatives_leaves_npv_undefined() {
        let cm = ConfusionMatrix::from_counts(2, 3, 0, 0);
        assert_eq!(cm.npv(), Metric::Undefined);
        assert_eq!(cm.false_omission_rate(), Metric::Undefined);
        assert_abs_diff_eq!(get(cm.ppv()), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn perfect_specificity_leaves_lr_plus_undefined() {
        let cm = ConfusionMatrix::from_counts(3, 0, 5, 2);
        assert_eq!(cm.positive_likelihood_ratio(), Metric::Undefined);
        assert_abs_diff_eq!(get(cm.negative_likelihood_ratio()), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn mcc_extremes() {
        assert_eq!(ConfusionMatrix::from_counts(4, 0, 6, 0).matthews_corrcoef(), 1.0);
        assert_eq!(ConfusionMatrix::from_counts(0, 6, 0, 4).matthews_corrcoef(), -1.0);
        // majority class only
        assert_eq!(ConfusionMatrix::from_counts(0, 0, 7, 3).matthews_corrcoef(), 0.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            ConfusionMatrix::from_binary(&[1, 0], &[1]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ConfusionMatrix::from_binary(&[], &[]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ConfusionMatrix::from_binary(&[2, 0], &[1, 0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn custom_positive_class() {
        let labels = ["sick", "healthy", "sick"];
        let predictions = ["sick", "sick", "healthy"];
        let cm = ConfusionMatrix::from_labels(&labels, &predictions, &"sick").unwrap();
        assert_eq!(cm, ConfusionMatrix::from_counts(1, 1, 0, 1));
    }

    #[test]
    fn threshold_splits_inclusive() {
        let cm = ConfusionMatrix::at_threshold(0.5, &[0.9, 0.5, 0.2], &[0.7, 0.1]);
        assert_eq!(cm, ConfusionMatrix::from_counts(2, 1, 1, 1));
    }

    #[test]
    fn transported_ppv_equals_observed_at_observed_prevalence() {
        let cm = example();
        let ppv = get(cm.ppv_at_prevalence(0.3).unwrap());
        assert_abs_diff_eq!(ppv, get(cm.ppv()), epsilon = 1e-9);
        let npv = get(cm.npv_at_prevalence(0.3).unwrap());
        assert_abs_diff_eq!(npv, get(cm.npv()), epsilon = 1e-9);

        // rarer condition, same test: fewer positive calls are right
        assert!(get(cm.ppv_at_prevalence(0.01).unwrap()) < ppv);
        assert!(cm.ppv_at_prevalence(1.5).is_err());
    }

    #[test]
    fn report_rows_in_order() {
        let rows = example().report().rows();
        assert_eq!(rows[0], ("tp", "2".to_string()));
        assert_eq!(rows.last().unwrap().0, "post_test_probability");
    }
}
