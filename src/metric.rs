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
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
/// Result of a ratio-shaped metric.
///
/// Whenever a denominator is zero the metric is `Undefined` instead of NaN or infinity, so callers
/// have to decide what an undefined value means for them.
pub enum Metric {
    Defined(f64),
    Undefined,
}

impl Metric {
    pub fn ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            Metric::Undefined
        } else {
            Metric::Defined(num / den)
        }
    }

    pub fn from_counts(num: usize, den: usize) -> Self {
        Self::ratio(num as f64, den as f64)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Defined(v) => Metric::Defined(f(v)),
            Metric::Undefined => Metric::Undefined,
        }
    }

    /// Combines two defined metrics, undefined if either is.
    pub fn zip_with(self, other: Metric, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Metric::Defined(a), Metric::Defined(b)) => Metric::Defined(f(a, b)),
            _ => Metric::Undefined,
        }
    }

    /// `self / other`, undefined if either side is undefined or `other` is zero.
    pub fn divide(self, other: Metric) -> Self {
        match (self, other) {
            (Metric::Defined(a), Metric::Defined(b)) => Metric::ratio(a, b),
            _ => Metric::Undefined,
        }
    }

    /// Turns the sentinel into an error for callers that can't continue without a value.
    pub fn required(self, name: &'static str) -> Result<f64> {
        self.value().ok_or(Error::UndefinedMetric(name))
    }
}

impl From<Metric> for Option<f64> {
    fn from(value: Metric) -> Self {
        value.value()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => write!(f, "{v}"),
            Metric::Undefined => write!(f, "undefined"),
        }
    }
}
