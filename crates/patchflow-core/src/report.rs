//! Patch report rows for export consumers

use crate::fixture::FixtureInstance;
use crate::library::FixtureLibrary;
use crate::sort::SortMode;
use serde::{Deserialize, Serialize};

/// Report options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Row ordering
    pub sort: SortMode,
    /// Include fixed-installation fixtures
    pub include_fixed: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            sort: SortMode::PatchLoc,
            include_fixed: true,
        }
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Fixture ID
    pub fid: u32,
    /// Display name
    pub name: String,
    /// Manufacturer, `-` when the type is unknown
    pub manufacturer: String,
    /// Type model name, `-` when unknown
    pub type_name: String,
    /// Mode, `-` when unknown
    pub mode: String,
    /// `U.A` label
    pub patch: String,
    /// Location, `-` when empty
    pub location: String,
    /// Fixed installation
    pub is_fixed: bool,
    /// Footprint, 0 when unknown
    pub channels: u16,
}

/// A sorted, filtered report with totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchReport {
    /// Rows in report order
    pub rows: Vec<ReportRow>,
    /// Sum of footprints over the rows
    pub total_parameters: u64,
}

impl PatchReport {
    /// Build a report over `fixtures`
    pub fn build(
        fixtures: &[FixtureInstance],
        library: &FixtureLibrary,
        options: ReportOptions,
    ) -> Self {
        let mut selected: Vec<FixtureInstance> = fixtures
            .iter()
            .filter(|f| options.include_fixed || !f.is_fixed)
            .cloned()
            .collect();
        options.sort.sort(&mut selected);

        let dash = || "-".to_string();
        let rows: Vec<ReportRow> = selected
            .into_iter()
            .map(|f| {
                let ty = library.get(&f.type_id);
                ReportRow {
                    fid: f.fid,
                    patch: f.patch_label(),
                    manufacturer: ty.map(|t| t.manufacturer.clone()).unwrap_or_else(dash),
                    type_name: ty.map(|t| t.name.clone()).unwrap_or_else(dash),
                    mode: ty.map(|t| t.mode.clone()).unwrap_or_else(dash),
                    channels: ty.map(|t| t.channels).unwrap_or(0),
                    location: if f.location.is_empty() {
                        dash()
                    } else {
                        f.location
                    },
                    is_fixed: f.is_fixed,
                    name: f.name,
                }
            })
            .collect();
        let total_parameters = rows.iter().map(|r| u64::from(r.channels)).sum();
        Self {
            rows,
            total_parameters,
        }
    }

    /// Number of fixtures in the report
    pub fn fixture_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureId, FixtureType};

    fn fixture(fid: u32, address: u16, is_fixed: bool, type_id: &str) -> FixtureInstance {
        FixtureInstance {
            id: FixtureId::from(format!("fix-{fid}")),
            fid,
            name: format!("Unit {fid}"),
            type_id: type_id.to_string(),
            universe: 1,
            address,
            color: String::new(),
            location: String::new(),
            is_fixed,
        }
    }

    #[test]
    fn test_report_excludes_fixed_and_totals() {
        let lib = FixtureLibrary::from_types(vec![FixtureType::new("par", "Acme", "Par", "4ch", 4)]);
        let fixtures = vec![
            fixture(2, 5, false, "par"),
            fixture(1, 1, true, "par"),
            fixture(3, 20, false, "gone"),
        ];
        let report = PatchReport::build(
            &fixtures,
            &lib,
            ReportOptions {
                sort: SortMode::FidPatch,
                include_fixed: false,
            },
        );
        assert_eq!(report.fixture_count(), 2);
        assert_eq!(report.total_parameters, 4);
        assert_eq!(report.rows[0].fid, 2);
        assert_eq!(report.rows[1].manufacturer, "-");
        assert_eq!(report.rows[1].location, "-");

        let all = PatchReport::build(&fixtures, &lib, ReportOptions::default());
        assert_eq!(all.rows[0].patch, "1.1");
        assert_eq!(all.total_parameters, 8);
    }
}
