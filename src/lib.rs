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

//! Diagnostic metrics of binary classifiers and how they behave when the prevalence of the
//! positive class changes.

pub mod confusion;
pub mod curve;
pub mod dataset;
pub mod error;
pub mod metric;
pub mod resample;

pub use confusion::{ConfusionMatrix, Report};
pub use curve::{pr_curve, roc_curve, trapezoid, PrCurve, PrPoint, RocCurve, RocPoint, ScoreSet};
pub use dataset::{Sample, Samples};
pub use error::{Error, Result};
pub use metric::Metric;
pub use resample::{resample_indices, PrevalenceShift, ShiftRow};
