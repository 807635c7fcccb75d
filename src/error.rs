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

use thiserror::Error;

#[derive(Debug, Error)]
/// All possible errors of this crate
pub enum Error {
    /// Labels, predictions or scores don't fit together (empty, different lengths, bad values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A metric was required, but its denominator is zero for this input
    #[error("metric `{0}` is undefined for this input")]
    UndefinedMetric(&'static str),

    /// Samples file can't be read or parsed
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Report or curve can't be serialized
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with `InvalidInput` unless both slices are non-empty and equally long.
pub(crate) fn check_paired<A, B>(left: &[A], right: &[B], what: &str) -> Result<()> {
    if left.is_empty() {
        return Err(Error::InvalidInput("empty label vector".into()));
    }
    if left.len() != right.len() {
        return Err(Error::InvalidInput(format!(
            "label length {} != {what} length {}",
            left.len(),
            right.len()
        )));
    }
    Ok(())
}
