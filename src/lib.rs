//! Meteorological input-job pipeline: fetch raw time series for a point
//! and year range from a climate data provider, normalize them into the
//! canonical six-variable forcing schema, and hand the result to an
//! external converter that produces a binary .nc artifact.
//!
//! Start with [`Metforge`], the client facade; everything else hangs off
//! the traits it is wired from ([`JobStore`], [`ForcingProvider`],
//! [`ConversionGateway`]).

mod acquisition;
mod convert;
mod error;
mod metforge;
mod normalize;
mod pipeline;
mod store;
mod types;
mod validation;

pub use error::MetforgeError;
pub use metforge::*;

pub use acquisition::daymet::{DaymetProvider, DAYMET_BASE_URL};
pub use acquisition::error::ProviderError;
pub use acquisition::power::{PowerProvider, POWER_BASE_URL};
pub use acquisition::provider::{AcquisitionRequest, ForcingProvider};

pub use convert::error::ConvertError;
pub use convert::{ConversionGateway, HttpConversionGateway, CONVERTER_BASE_URL};

pub use normalize::{normalize, MappingEntry, VariableMapping, DAYMET_MAPPING, POWER_MAPPING};

pub use store::memory::MemoryJobStore;
pub use store::{JobStore, StoreError};

pub use types::dataset::{
    DatasetParseError, ForcingDataset, CANONICAL_VARIABLES, DATASET_PLACEHOLDER,
};
pub use types::job::{
    Job, JobStatus, JobUpdate, Location, NewJob, Owner, Period, SourceMode, TimeStep,
};
pub use types::raw_table::RawTable;

pub use validation::{FieldError, ValidationError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
