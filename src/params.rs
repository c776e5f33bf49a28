//! Grouping of raw rows and the immutable lookup tables derived from them.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AllocationError;
use crate::types::{CandidateRow, CostSchedule};

/// Row indices per network, in input order. Built with a single grouping
/// pass, so rows of one network do not have to be contiguous in the input.
#[derive(Debug)]
pub struct NetworkIndex {
    groups: BTreeMap<String, Vec<usize>>,
}

pub fn group_rows(rows: &[CandidateRow]) -> NetworkIndex {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups.entry(row.network.clone()).or_default().push(i);
    }
    NetworkIndex { groups }
}

impl NetworkIndex {
    /// Indices of all rows belonging to `network`; empty for an unknown one.
    pub fn rows_for(&self, network: &str) -> &[usize] {
        self.groups.get(network).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Rank and demand tables, derived once per solve and passed by reference
/// into the model builder.
#[derive(Debug)]
pub struct ParameterTables {
    ranks: BTreeMap<(String, String), i64>,
    demands: BTreeMap<String, i64>,
}

impl ParameterTables {
    /// Scans each declared network's row group. The first row of a group
    /// supplies the network's demand; the first row per store supplies the
    /// rank. A declared network without any row is a data-integrity error.
    /// Rows for stores outside the declared set carry no rank entry, since
    /// those stores never enter a constraint.
    pub fn build(
        rows: &[CandidateRow],
        index: &NetworkIndex,
        stores: &BTreeSet<String>,
        networks: &BTreeSet<String>,
    ) -> Result<Self, AllocationError> {
        let mut ranks = BTreeMap::new();
        let mut demands = BTreeMap::new();

        for network in networks {
            let group = index.rows_for(network);
            let first = group
                .first()
                .ok_or_else(|| AllocationError::MissingDemand(network.clone()))?;
            demands.insert(network.clone(), rows[*first].hubs_needed);

            for &i in group {
                let row = &rows[i];
                if !stores.contains(&row.store) {
                    continue;
                }
                ranks
                    .entry((row.store.clone(), network.clone()))
                    .or_insert(row.rank);
            }
        }

        Ok(Self { ranks, demands })
    }

    pub fn rank(&self, store: &str, network: &str) -> Option<i64> {
        self.ranks
            .get(&(store.to_owned(), network.to_owned()))
            .copied()
    }

    /// Objective coefficient for a pair: the recorded rank, or the naive
    /// penalty when the pair is undocumented. The penalty keeps the model
    /// structurally feasible on sparse data instead of erroring out.
    pub fn rank_or_penalty(&self, store: &str, network: &str, costs: &CostSchedule) -> f64 {
        self.rank(store, network)
            .map(|rank| rank as f64)
            .unwrap_or_else(|| costs.naive_penalty())
    }

    /// Demand for a declared network. `build` guarantees presence, so a miss
    /// here means the caller asked about an undeclared network.
    pub fn demand(&self, network: &str) -> i64 {
        self.demands.get(network).copied().unwrap_or(0)
    }

    /// Enforces the rank side of the cost-tier ordering: every recorded rank
    /// must stay strictly below the relaxation cost, otherwise the solver
    /// could prefer breaking the hub cap over a documented assignment.
    pub fn check_cost_tiers(&self, costs: &CostSchedule) -> Result<(), AllocationError> {
        for ((store, network), &rank) in &self.ranks {
            if rank as f64 >= costs.relaxation_cost() {
                return Err(AllocationError::CostTierViolation {
                    store: store.clone(),
                    network: network.clone(),
                    rank,
                    relaxation_cost: costs.relaxation_cost(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(network: &str, store: &str, rank: i64, hubs_needed: i64) -> CandidateRow {
        CandidateRow {
            network: network.to_owned(),
            store: store.to_owned(),
            rank,
            hubs_needed,
        }
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn grouping_handles_interleaved_networks() {
        // N1 rows are deliberately non-contiguous.
        let rows = vec![
            row("N1", "A", 1, 2),
            row("N2", "B", 4, 1),
            row("N1", "C", 3, 2),
        ];
        let index = group_rows(&rows);
        assert_eq!(index.rows_for("N1"), &[0, 2]);
        assert_eq!(index.rows_for("N2"), &[1]);
        assert!(index.rows_for("N3").is_empty());

        let tables =
            ParameterTables::build(&rows, &index, &ids(&["A", "B", "C"]), &ids(&["N1", "N2"]))
                .unwrap();
        assert_eq!(tables.rank("C", "N1"), Some(3));
        assert_eq!(tables.demand("N1"), 2);
        assert_eq!(tables.demand("N2"), 1);
    }

    #[test]
    fn first_record_wins_for_rank_and_demand() {
        let rows = vec![row("N1", "A", 1, 2), row("N1", "A", 7, 9)];
        let index = group_rows(&rows);
        let tables = ParameterTables::build(&rows, &index, &ids(&["A"]), &ids(&["N1"])).unwrap();
        assert_eq!(tables.rank("A", "N1"), Some(1));
        assert_eq!(tables.demand("N1"), 2);
    }

    #[test]
    fn declared_network_without_rows_is_missing_demand() {
        let rows = vec![row("N1", "A", 1, 1)];
        let index = group_rows(&rows);
        let err = ParameterTables::build(&rows, &index, &ids(&["A"]), &ids(&["N1", "N2"]))
            .unwrap_err();
        assert!(matches!(err, AllocationError::MissingDemand(network) if network == "N2"));
    }

    #[test]
    fn undocumented_pair_falls_back_to_penalty() {
        let rows = vec![row("N1", "A", 1, 1)];
        let index = group_rows(&rows);
        let tables = ParameterTables::build(&rows, &index, &ids(&["A", "B"]), &ids(&["N1"]))
            .unwrap();
        let costs = CostSchedule::new(1000.0).unwrap();
        assert_eq!(tables.rank("B", "N1"), None);
        assert_eq!(tables.rank_or_penalty("B", "N1", &costs), 10_000_000.0);
        assert_eq!(tables.rank_or_penalty("A", "N1", &costs), 1.0);
    }

    #[test]
    fn rank_reaching_relaxation_cost_is_rejected() {
        let rows = vec![row("N1", "A", 1000, 1)];
        let index = group_rows(&rows);
        let tables = ParameterTables::build(&rows, &index, &ids(&["A"]), &ids(&["N1"])).unwrap();
        let costs = CostSchedule::new(1000.0).unwrap();
        let err = tables.check_cost_tiers(&costs).unwrap_err();
        assert!(matches!(err, AllocationError::CostTierViolation { rank: 1000, .. }));
    }
}
