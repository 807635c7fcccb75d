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

//! Resampling of labelled predictions to a different class prevalence.
//!
//! The classifier's behaviour per class stays the same, only the mix of classes changes. This is
//! what separates prevalence-invariant metrics (sensitivity, specificity, likelihood ratios) from
//! prevalence-dependent ones (PPV, NPV, accuracy).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::confusion::ConfusionMatrix;
use crate::error::{check_paired, Error, Result};
use crate::metric::Metric;

/// Draws `size` indices into `labels` with replacement, `round(prevalence * size)` of them
/// positive, in random order.
///
/// # Errors
/// - `Error::InvalidInput` if `size` is zero, `prevalence` is outside `[0, 1]` or a class that is
/// needed has no samples
pub fn resample_indices<R: Rng + ?Sized>(
    labels: &[bool],
    prevalence: f64,
    size: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if size == 0 {
        return Err(Error::InvalidInput("sample size must be positive".into()));
    }
    if !(0.0..=1.0).contains(&prevalence) {
        return Err(Error::InvalidInput(format!(
            "prevalence {prevalence} not in [0, 1]"
        )));
    }

    let (pos, neg): (Vec<usize>, Vec<usize>) = (0..labels.len()).partition(|&i| labels[i]);
    let amount_pos = (prevalence * size as f64).round() as usize;
    let amount_neg = size - amount_pos;

    let mut indices = Vec::with_capacity(size);
    for (pool, amount, class) in [(&pos, amount_pos, "positive"), (&neg, amount_neg, "negative")] {
        if amount == 0 {
            continue;
        }
        if pool.is_empty() {
            return Err(Error::InvalidInput(format!("no {class} samples to draw from")));
        }
        indices.extend((0..amount).filter_map(|_| pool.choose(&mut *rng).copied()));
    }
    indices.shuffle(rng);
    Ok(indices)
}

#[derive(Debug, Clone, Serialize)]
/// Metrics averaged over all resampling rounds at one prevalence. Each mean only covers the
/// rounds in which the metric was defined.
pub struct ShiftRow {
    pub prevalence: f64,
    pub sensitivity: Metric,
    pub specificity: Metric,
    pub ppv: Metric,
    pub positive_likelihood_ratio: Metric,
    pub negative_likelihood_ratio: Metric,
    /// Rounds without any false positive, where LR+ is undefined
    pub undefined_lr_pos: usize,
}

fn mean(values: impl Iterator<Item = Metric>) -> Metric {
    let (sum, count) = values
        .filter_map(Metric::value)
        .fold((0., 0), |(sum, count), v| (sum + v, count + 1));
    Metric::ratio(sum, count as f64)
}

/// Repeatedly resamples a labelled prediction vector to a target prevalence.
pub struct PrevalenceShift<'a> {
    labels: &'a [bool],
    predictions: &'a [bool],

    /// Resampling rounds per prevalence
    pub rounds: usize,

    /// Samples drawn per round
    pub size: usize,
}

impl<'a> PrevalenceShift<'a> {
    /// # Errors
    /// - `Error::InvalidInput` if the vectors are empty or differ in length, or `rounds` or `size`
    /// is zero
    pub fn new(
        labels: &'a [bool],
        predictions: &'a [bool],
        rounds: usize,
        size: usize,
    ) -> Result<Self> {
        check_paired(labels, predictions, "prediction")?;
        if rounds == 0 || size == 0 {
            return Err(Error::InvalidInput(
                "rounds and size must be positive".into(),
            ));
        }
        Ok(Self {
            labels,
            predictions,
            rounds,
            size,
        })
    }

    /// Runs all rounds at `prevalence`.
    pub fn at<R: Rng + ?Sized>(&self, prevalence: f64, rng: &mut R) -> Result<ShiftRow> {
        let mut matrices = Vec::with_capacity(self.rounds);
        for _ in 0..self.rounds {
            let indices = resample_indices(self.labels, prevalence, self.size, rng)?;
            let labels: Vec<bool> = indices.iter().map(|&i| self.labels[i]).collect();
            let predictions: Vec<bool> = indices.iter().map(|&i| self.predictions[i]).collect();
            matrices.push(ConfusionMatrix::from_bools(&labels, &predictions)?);
        }

        let undefined_lr_pos = matrices
            .iter()
            .filter(|cm| !cm.positive_likelihood_ratio().is_defined())
            .count();
        if undefined_lr_pos > 0 {
            log::warn!(
                "LR+ undefined in {undefined_lr_pos} of {} rounds at prevalence {prevalence}",
                self.rounds
            );
        }

        Ok(ShiftRow {
            prevalence,
            sensitivity: mean(matrices.iter().map(ConfusionMatrix::sensitivity)),
            specificity: mean(matrices.iter().map(ConfusionMatrix::specificity)),
            ppv: mean(matrices.iter().map(ConfusionMatrix::ppv)),
            positive_likelihood_ratio: mean(
                matrices
                    .iter()
                    .map(ConfusionMatrix::positive_likelihood_ratio),
            ),
            negative_likelihood_ratio: mean(
                matrices
                    .iter()
                    .map(ConfusionMatrix::negative_likelihood_ratio),
            ),
            undefined_lr_pos,
        })
    }

    /// Runs `at` for every prevalence with a generator seeded by `seed`. Prevalences may come from
    /// any iterator, e.g. one wrapped in a progress bar.
    pub fn sweep<'p>(
        &self,
        prevalences: impl IntoIterator<Item = &'p f64>,
        seed: u64,
    ) -> Result<Vec<ShiftRow>> {
        let mut rng = StdRng::seed_from_u64(seed);
        prevalences
            .into_iter()
            .map(|&prevalence| self.at(prevalence, &mut rng))
            .collect()
    }
}
