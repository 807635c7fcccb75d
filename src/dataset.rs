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

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Deserialize, Debug, Clone, PartialEq)]
/// One evaluated sample: ground truth plus what the classifier said about it.
/// A file may provide a hard `prediction`, a `score`, or both.
pub struct Sample {
    pub label: u8,
    pub prediction: Option<u8>,
    pub score: Option<f64>,
}

/// Samples read from a delimited file with a `label[,prediction][,score]` header. Labels and
/// predictions are `0` or `1`.
pub struct Samples {
    pub samples: Vec<Sample>,
    name: String,
}

impl Samples {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_path(path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "samples".into());
        Self::collect(reader, name)
    }

    pub fn from_reader<R: Read>(rdr: R, delimiter: u8, name: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(rdr);
        Self::collect(reader, name.into())
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>, name: String) -> Result<Self> {
        let mut samples: Vec<Sample> = Vec::new();
        for (row, record) in reader.deserialize().enumerate() {
            let sample: Sample = record?;
            check_binary(sample.label, "label", row)?;
            if let Some(prediction) = sample.prediction {
                check_binary(prediction, "prediction", row)?;
            }
            samples.push(sample);
        }
        if samples.is_empty() {
            return Err(Error::InvalidInput(format!("{name} contains no samples")));
        }

        log::info!("Loaded {} samples from {name}", samples.len());
        Ok(Self { samples, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn labels(&self, positive: u8) -> Vec<bool> {
        self.samples.iter().map(|s| s.label == positive).collect()
    }

    /// # Errors
    /// - `Error::InvalidInput` if a row has no prediction
    pub fn predictions(&self, positive: u8) -> Result<Vec<bool>> {
        self.samples
            .iter()
            .enumerate()
            .map(|(row, s)| {
                s.prediction
                    .map(|p| p == positive)
                    .ok_or_else(|| missing("prediction", row))
            })
            .collect()
    }

    /// # Errors
    /// - `Error::InvalidInput` if a row has no score
    pub fn scores(&self) -> Result<Vec<f64>> {
        self.samples
            .iter()
            .enumerate()
            .map(|(row, s)| s.score.ok_or_else(|| missing("score", row)))
            .collect()
    }

    /// Predictions derived from scores: `score >= threshold` is positive.
    pub fn predictions_at(&self, threshold: f64) -> Result<Vec<bool>> {
        Ok(self
            .scores()?
            .into_iter()
            .map(|score| score >= threshold)
            .collect())
    }
}

fn check_binary(value: u8, column: &str, row: usize) -> Result<()> {
    if value > 1 {
        return Err(Error::InvalidInput(format!(
            "row {} has {column} {value}, expected 0 or 1",
            row + 1
        )));
    }
    Ok(())
}

fn missing(column: &str, row: usize) -> Error {
    Error::InvalidInput(format!("row {} has no {column}", row + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "label,prediction,score\n1,1,0.9\n0,0,0.2\n1,0,0.4\n0,1,0.6\n";

    #[test]
    fn reads_all_columns() {
        let samples = Samples::from_reader(DATA.as_bytes(), b',', "toy").unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples.name(), "toy");
        assert_eq!(samples.labels(1), vec![true, false, true, false]);
        assert_eq!(
            samples.predictions(1).unwrap(),
            vec![true, false, false, true]
        );
        assert_eq!(samples.scores().unwrap(), vec![0.9, 0.2, 0.4, 0.6]);
        assert_eq!(
            samples.predictions_at(0.5).unwrap(),
            vec![true, false, false, true]
        );
    }

    #[test]
    fn positive_class_is_configurable() {
        let samples = Samples::from_reader(DATA.as_bytes(), b',', "toy").unwrap();
        assert_eq!(samples.labels(0), vec![false, true, false, true]);
    }

    #[test]
    fn missing_score_column() {
        let data = "label\tprediction\n1\t1\n0\t1\n";
        let samples = Samples::from_reader(data.as_bytes(), b'\t', "tabs").unwrap();
        assert!(samples.predictions(1).is_ok());
        assert!(matches!(samples.scores(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn empty_file_is_rejected() {
        let res = Samples::from_reader("label,score\n".as_bytes(), b',', "empty");
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn non_binary_values_are_rejected() {
        let data = "label,prediction\n1,1\n7,3\n0,0\n";
        let res = Samples::from_reader(data.as_bytes(), b',', "bad");
        assert!(matches!(res, Err(Error::InvalidInput(msg)) if msg.contains("row 2")));

        let res = Samples::from_reader("label,prediction\n1,2\n".as_bytes(), b',', "bad");
        assert!(matches!(res, Err(Error::InvalidInput(msg)) if msg.contains("prediction")));
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let res = Samples::from_reader("label,score\nx,0.1\n".as_bytes(), b',', "bad");
        assert!(matches!(res, Err(Error::Csv(_))));
    }
}
