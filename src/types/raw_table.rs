//! In-memory tabular form of a provider response: one ordered series per
//! provider variable, keyed by the provider's time index.

use indexmap::IndexMap;

/// Raw per-variable time series as returned by a [`crate::ForcingProvider`].
///
/// Each variable maps to an ordered `time key -> value` series. Insertion
/// order is preserved on both levels, so the table reflects exactly the
/// grouping and ordering of the provider response; no reordering or
/// deduplication happens here.
///
/// Time keys are provider-specific: the Daymet adapter uses the composite
/// `"{year}_{yday}"` key, NASA POWER uses its own timestamp strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    series: IndexMap<String, IndexMap<String, f64>>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable without any samples yet. Used so that variables
    /// present in a response header survive even when no data rows follow.
    pub fn ensure_variable(&mut self, variable: &str) {
        if !self.series.contains_key(variable) {
            self.series.insert(variable.to_string(), IndexMap::new());
        }
    }

    pub fn insert(&mut self, variable: &str, time_key: &str, value: f64) {
        self.series
            .entry(variable.to_string())
            .or_default()
            .insert(time_key.to_string(), value);
    }

    /// The series for one provider variable, in insertion order.
    pub fn variable(&self, name: &str) -> Option<&IndexMap<String, f64>> {
        self.series.get(name)
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut table = RawTable::new();
        table.insert("srad (W/m^2)", "1980_1", 300.0);
        table.insert("tmax (deg c)", "1980_1", 21.5);
        table.insert("srad (W/m^2)", "1980_2", 310.0);

        let names: Vec<&str> = table.variable_names().collect();
        assert_eq!(names, ["srad (W/m^2)", "tmax (deg c)"]);

        let srad = table.variable("srad (W/m^2)").unwrap();
        let keys: Vec<&String> = srad.keys().collect();
        assert_eq!(keys, ["1980_1", "1980_2"]);
    }

    #[test]
    fn ensure_variable_keeps_headers_without_rows() {
        let mut table = RawTable::new();
        table.ensure_variable("vp (Pa)");
        assert!(table.variable("vp (Pa)").unwrap().is_empty());
        assert_eq!(table.len(), 1);
    }
}
