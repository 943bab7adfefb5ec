//! The canonical six-variable forcing dataset and its persisted JSON form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical output variable names, in declaration order.
///
/// Both providers are mapped into this single schema: air temperature,
/// relative humidity, wind speed, surface pressure, outgoing photosynthetic
/// photon flux density, and precipitation.
pub const CANONICAL_VARIABLES: [&str; 6] = ["TA", "RH", "WS", "PA", "PPFD_OUT", "P"];

/// JSON text stored on a job before acquisition has produced a dataset.
pub const DATASET_PLACEHOLDER: &str = "{}";

#[derive(Debug, Error)]
pub enum DatasetParseError {
    #[error("normalized dataset is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("unexpected token '{token}' in series '{variable}'")]
    UnexpectedToken { variable: String, token: String },
}

/// One raw JSON sample: a number, the `null` sentinel, or the legacy `"NA"`
/// string sentinel. Anything else is rejected on parse.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSample {
    Number(f64),
    Text(String),
    Null,
}

/// The normalized, unit-converted dataset produced by the variable mapper.
///
/// Keys are canonical variable names in mapping order; values are ordered
/// sample sequences where a gap is represented as `None` (serialized as
/// JSON `null`), never omitted. A variable the provider did not supply is
/// present with an empty sequence.
///
/// Serialization round-trips: [`ForcingDataset::from_json`] applied to
/// [`ForcingDataset::to_json`] output yields an equal dataset, including
/// key ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForcingDataset {
    series: IndexMap<String, Vec<Option<f64>>>,
}

impl ForcingDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: &str, samples: Vec<Option<f64>>) {
        self.series.insert(variable.to_string(), samples);
    }

    pub fn get(&self, variable: &str) -> Option<&[Option<f64>]> {
        self.series.get(variable).map(Vec::as_slice)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Serializes into the persisted text form (`null` for missing samples).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the persisted text form back into a dataset.
    ///
    /// Accepts numbers, `null`, and the `"NA"` string as the missing-sample
    /// sentinel; any other string fails with
    /// [`DatasetParseError::UnexpectedToken`].
    pub fn from_json(text: &str) -> Result<Self, DatasetParseError> {
        let raw: IndexMap<String, Vec<RawSample>> = serde_json::from_str(text)?;
        let mut series = IndexMap::with_capacity(raw.len());
        for (variable, samples) in raw {
            let mut converted = Vec::with_capacity(samples.len());
            for sample in samples {
                converted.push(match sample {
                    RawSample::Number(value) => Some(value),
                    RawSample::Null => None,
                    RawSample::Text(token) if token == "NA" => None,
                    RawSample::Text(token) => {
                        return Err(DatasetParseError::UnexpectedToken { variable, token })
                    }
                });
            }
            series.insert(variable, converted);
        }
        Ok(Self { series })
    }
}
