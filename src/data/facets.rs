use std::collections::BTreeSet;

use serde::Serialize;

use super::model::DatasetStore;

/// Distinct filter options offered to clients. Each set is sorted ascending
/// and never contains nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub cities: BTreeSet<String>,
    pub branches: BTreeSet<String>,
    pub seat_types: BTreeSet<String>,
}

/// Collect the facet sets over the whole cutoff table.
pub fn facets(store: &DatasetStore) -> Facets {
    let mut out = Facets::default();
    for rec in &store.cutoffs {
        if let Some(city) = &rec.city {
            out.cities.insert(city.clone());
        }
        if let Some(branch) = &rec.branch {
            out.branches.insert(branch.clone());
        }
        if let Some(seat_type) = &rec.seat_type {
            out.seat_types.insert(seat_type.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AdmissionRecord;

    #[test]
    fn facets_are_sorted_distinct_and_skip_missing() {
        let mut no_branch = AdmissionRecord::new("Sigma College", "x", "TFWS", "MHT-CET", 60.0);
        no_branch.branch = None;
        let store = DatasetStore::from_records(
            vec![
                AdmissionRecord::new("Zeta College, Pune", "IT", "GOPENS", "MHT-CET", 90.0),
                AdmissionRecord::new("ABC College, Mumbai", "CS", "GOPENS", "MHT-CET", 80.0),
                AdmissionRecord::new("Gamma College, Pune", "CS", "LOPENS", "JEE", 70.0),
                no_branch,
            ],
            Vec::new(),
        );

        let f = facets(&store);
        assert_eq!(f.cities.iter().collect::<Vec<_>>(), vec!["Mumbai", "Pune"]);
        assert_eq!(f.branches.iter().collect::<Vec<_>>(), vec!["CS", "IT"]);
        assert_eq!(
            f.seat_types.iter().collect::<Vec<_>>(),
            vec!["GOPENS", "LOPENS", "TFWS"]
        );

        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["cities"], serde_json::json!(["Mumbai", "Pune"]));
    }
}
