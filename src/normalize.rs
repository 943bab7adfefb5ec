//! The variable mapper: provider variable names and units in, the canonical
//! six-variable dataset out.
//!
//! This stage is pure and total: the same raw table and mapping always
//! produce the same dataset, and nothing here performs I/O or fails. A
//! provider variable missing from the table is logged and mapped to an
//! empty series, never raised.

use crate::types::dataset::ForcingDataset;
use crate::types::raw_table::RawTable;
use log::warn;

/// Divisor turning shortwave radiation into a photon flux rate.
const RADIATION_TO_PPFD: f64 = 1.0 / (0.48 * 4.6);

/// kPa-scale pressure to Pa.
const KPA_TO_PA: f64 = 1000.0;

/// One canonical variable and the provider series feeding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingEntry {
    pub canonical: &'static str,
    pub provider: &'static str,
    /// Multiplied onto every sample, exactly once.
    pub factor: f64,
}

/// A provider's fixed six-entry mapping table, in canonical declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableMapping {
    pub entries: [MappingEntry; 6],
}

const fn entry(canonical: &'static str, provider: &'static str, factor: f64) -> MappingEntry {
    MappingEntry {
        canonical,
        provider,
        factor,
    }
}

/// Daymet daily series into the canonical schema.
///
/// The pairings and factors are carried over from the production mapping
/// as-is, including the `WS` entry that Daymet never returns (the request
/// does not ask for a wind variable), which therefore always yields an
/// empty series.
pub static DAYMET_MAPPING: VariableMapping = VariableMapping {
    entries: [
        entry("TA", "tmax (deg c)", 1.0),
        entry("RH", "vp (Pa)", 1.0),
        entry("WS", "WS", 1.0),
        entry("PA", "srad (W/m^2)", KPA_TO_PA),
        entry("PPFD_OUT", "prcp (mm/day)", RADIATION_TO_PPFD),
        entry("P", "dayl (s)", 1.0),
    ],
};

/// NASA POWER hourly series into the canonical schema.
pub static POWER_MAPPING: VariableMapping = VariableMapping {
    entries: [
        entry("TA", "T2M", 1.0),
        entry("RH", "RH2M", 1.0),
        entry("WS", "WS2M", 1.0),
        entry("PA", "PS", KPA_TO_PA),
        entry("PPFD_OUT", "CLRSKY_SFC_PAR_TOT", RADIATION_TO_PPFD),
        entry("P", "PRECTOTCORR", 1.0),
    ],
};

/// Maps a raw provider table into the canonical dataset.
///
/// For each mapping entry, in order: extract the provider series in table
/// iteration order and scale every sample by the conversion factor.
/// Non-finite results (NaN cells from the tabular parser) become the
/// missing-sample sentinel.
pub fn normalize(raw: &RawTable, mapping: &VariableMapping) -> ForcingDataset {
    let mut dataset = ForcingDataset::new();
    for entry in &mapping.entries {
        match raw.variable(entry.provider) {
            Some(series) => {
                let samples = series
                    .values()
                    .map(|value| {
                        let scaled = value * entry.factor;
                        scaled.is_finite().then_some(scaled)
                    })
                    .collect();
                dataset.insert(entry.canonical, samples);
            }
            None => {
                warn!(
                    "provider variable '{}' missing, emitting empty series for {}",
                    entry.provider, entry.canonical
                );
                dataset.insert(entry.canonical, Vec::new());
            }
        }
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dataset::CANONICAL_VARIABLES;

    fn daymet_style_table() -> RawTable {
        let mut table = RawTable::new();
        for (day, value) in [("2015_1", 5.5), ("2015_2", 6.25)] {
            table.insert("tmax (deg c)", day, value);
        }
        for (day, value) in [("2015_1", 280.0), ("2015_2", 300.5)] {
            table.insert("vp (Pa)", day, value);
        }
        for (day, value) in [("2015_1", 300.0), ("2015_2", 310.0)] {
            table.insert("srad (W/m^2)", day, value);
        }
        for (day, value) in [("2015_1", 0.0), ("2015_2", 2.5)] {
            table.insert("prcp (mm/day)", day, value);
        }
        for (day, value) in [("2015_1", 34000.0), ("2015_2", 34100.0)] {
            table.insert("dayl (s)", day, value);
        }
        table
    }

    #[test]
    fn maps_all_canonical_variables_in_order() {
        let dataset = normalize(&daymet_style_table(), &DAYMET_MAPPING);
        let names: Vec<&str> = dataset.variable_names().collect();
        assert_eq!(names, CANONICAL_VARIABLES);
    }

    #[test]
    fn applies_conversion_factors_once() {
        let dataset = normalize(&daymet_style_table(), &DAYMET_MAPPING);
        assert_eq!(dataset.get("TA").unwrap(), &[Some(5.5), Some(6.25)]);
        assert_eq!(
            dataset.get("PA").unwrap(),
            &[Some(300_000.0), Some(310_000.0)]
        );
        assert_eq!(
            dataset.get("PPFD_OUT").unwrap(),
            &[Some(0.0), Some(2.5 * (1.0 / (0.48 * 4.6)))]
        );
    }

    #[test]
    fn is_idempotent_over_reruns() {
        let table = daymet_style_table();
        let first = normalize(&table, &DAYMET_MAPPING);
        let second = normalize(&table, &DAYMET_MAPPING);
        // Same input, same output; factors never compound because the raw
        // table is untouched.
        assert_eq!(first, second);
    }

    #[test]
    fn missing_provider_variable_yields_empty_series() {
        let dataset = normalize(&daymet_style_table(), &DAYMET_MAPPING);
        // Daymet has no wind series; the canonical slot stays empty.
        assert_eq!(dataset.get("WS").unwrap(), &[]);
    }

    #[test]
    fn nan_samples_become_missing() {
        let mut table = RawTable::new();
        table.insert("T2M", "2015010100", 3.0);
        table.insert("T2M", "2015010101", f64::NAN);
        let dataset = normalize(&table, &POWER_MAPPING);
        assert_eq!(dataset.get("TA").unwrap(), &[Some(3.0), None]);
    }
}
