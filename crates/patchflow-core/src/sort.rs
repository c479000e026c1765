//! Fixture ordering and filtering
//!
//! [`SortMode`] is the two-key ordering contract used by report and export
//! consumers. [`ListSort`] is the single-column ordering of the fixture list.

use crate::fixture::FixtureInstance;
use crate::library::FixtureLibrary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Primary/secondary key combinations for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// FID, then location
    FidLoc,
    /// Location, then FID
    LocFid,
    /// Placement, then location
    #[default]
    PatchLoc,
    /// Location, then placement
    LocPatch,
    /// FID, then placement
    FidPatch,
    /// Placement, then FID
    PatchFid,
}

impl SortMode {
    /// All modes
    pub const ALL: [SortMode; 6] = [
        SortMode::FidLoc,
        SortMode::LocFid,
        SortMode::PatchLoc,
        SortMode::LocPatch,
        SortMode::FidPatch,
        SortMode::PatchFid,
    ];

    /// Compare two fixtures: primary key first, secondary key on ties
    pub fn compare(self, a: &FixtureInstance, b: &FixtureInstance) -> Ordering {
        let fid = || a.fid.cmp(&b.fid);
        let patch = || a.patch_key().cmp(&b.patch_key());
        let loc = || a.location.cmp(&b.location);
        match self {
            SortMode::FidLoc => fid().then_with(loc),
            SortMode::LocFid => loc().then_with(fid),
            SortMode::PatchLoc => patch().then_with(loc),
            SortMode::LocPatch => loc().then_with(patch),
            SortMode::FidPatch => fid().then_with(patch),
            SortMode::PatchFid => patch().then_with(fid),
        }
    }

    /// Stable sort of `fixtures` by this mode
    pub fn sort(self, fixtures: &mut [FixtureInstance]) {
        fixtures.sort_by(|a, b| self.compare(a, b));
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fid_loc" => Ok(Self::FidLoc),
            "loc_fid" => Ok(Self::LocFid),
            "patch_loc" => Ok(Self::PatchLoc),
            "loc_patch" => Ok(Self::LocPatch),
            "fid_patch" => Ok(Self::FidPatch),
            "patch_fid" => Ok(Self::PatchFid),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

/// Column of the fixture list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSortKey {
    /// Fixture ID
    Fid,
    /// Display name
    Name,
    /// Type model name
    Type,
    /// Universe, then address
    #[default]
    Patch,
    /// Location label
    Location,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// Ordering of the fixture list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListSort {
    /// Column
    pub key: ListSortKey,
    /// Direction
    pub direction: SortDirection,
}

impl ListSort {
    /// Create a list ordering
    pub fn new(key: ListSortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Filter by `filter` and order the result
    pub fn apply<'a>(
        &self,
        fixtures: &'a [FixtureInstance],
        library: &FixtureLibrary,
        filter: &str,
    ) -> Vec<&'a FixtureInstance> {
        let mut result: Vec<_> = fixtures
            .iter()
            .filter(|f| matches_filter(f, library, filter))
            .collect();
        let type_name = |f: &FixtureInstance| {
            library
                .get(&f.type_id)
                .map(|t| t.name.clone())
                .unwrap_or_default()
        };
        result.sort_by(|a, b| {
            let ordering = match self.key {
                ListSortKey::Fid => a.fid.cmp(&b.fid),
                ListSortKey::Name => a.name.cmp(&b.name),
                ListSortKey::Type => type_name(a).cmp(&type_name(b)),
                ListSortKey::Location => a.location.cmp(&b.location),
                ListSortKey::Patch => (a.universe, a.address).cmp(&(b.universe, b.address)),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        result
    }
}

/// Case-insensitive search across name, FID, location, manufacturer,
/// type name and `U.A` patch label. An empty filter matches everything.
pub fn matches_filter(fixture: &FixtureInstance, library: &FixtureLibrary, filter: &str) -> bool {
    let search = filter.trim().to_lowercase();
    if search.is_empty() {
        return true;
    }
    let ty = library.get(&fixture.type_id);
    fixture.name.to_lowercase().contains(&search)
        || fixture.fid.to_string().contains(&search)
        || fixture.location.to_lowercase().contains(&search)
        || ty.is_some_and(|t| t.manufacturer.to_lowercase().contains(&search))
        || ty.is_some_and(|t| t.name.to_lowercase().contains(&search))
        || fixture.patch_label().contains(&search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureId, FixtureType};

    fn fixture(fid: u32, universe: u16, address: u16, location: &str) -> FixtureInstance {
        FixtureInstance {
            id: FixtureId::from(format!("fix-{fid}")),
            fid,
            name: format!("Par {fid}"),
            type_id: "par".to_string(),
            universe,
            address,
            color: String::new(),
            location: location.to_string(),
            is_fixed: false,
        }
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let mut fixtures = vec![
            fixture(3, 1, 1, "Truss"),
            fixture(1, 1, 1, "Floor"),
            fixture(2, 1, 1, "Bar"),
        ];
        SortMode::PatchFid.sort(&mut fixtures);
        let fids: Vec<_> = fixtures.iter().map(|f| f.fid).collect();
        assert_eq!(fids, vec![1, 2, 3]);
        SortMode::PatchLoc.sort(&mut fixtures);
        let locs: Vec<_> = fixtures.iter().map(|f| f.location.as_str()).collect();
        assert_eq!(locs, vec!["Bar", "Floor", "Truss"]);
    }

    #[test]
    fn test_location_is_case_sensitive() {
        let mut fixtures = vec![fixture(1, 1, 1, "bar"), fixture(2, 1, 5, "Zed")];
        SortMode::LocFid.sort(&mut fixtures);
        assert_eq!(fixtures[0].location, "Zed");
    }

    #[test]
    fn test_parse_modes() {
        for mode in SortMode::ALL {
            let name = serde_json::to_value(mode).unwrap();
            let parsed: SortMode = name.as_str().unwrap().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("sideways".parse::<SortMode>().is_err());
    }

    #[test]
    fn test_list_sort_and_filter() {
        let lib = FixtureLibrary::from_types(vec![FixtureType::new(
            "par", "Acme", "Par", "4ch", 4,
        )]);
        let fixtures = vec![
            fixture(2, 2, 1, "Stage"),
            fixture(1, 1, 9, "FOH"),
            fixture(3, 1, 1, "stage left"),
        ];
        let sort = ListSort::new(ListSortKey::Patch, SortDirection::Asc);
        let fids: Vec<_> = sort.apply(&fixtures, &lib, "").iter().map(|f| f.fid).collect();
        assert_eq!(fids, vec![3, 1, 2]);

        let sort = ListSort::new(ListSortKey::Fid, SortDirection::Desc);
        let fids: Vec<_> = sort
            .apply(&fixtures, &lib, "STAGE")
            .iter()
            .map(|f| f.fid)
            .collect();
        assert_eq!(fids, vec![3, 2]);

        assert_eq!(sort.apply(&fixtures, &lib, "acme").len(), 3);
        assert_eq!(sort.apply(&fixtures, &lib, "1.9").len(), 1);
    }
}
