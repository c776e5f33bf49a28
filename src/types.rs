use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::AllocationError;

/// One row of the candidate table. Field names mirror the upstream
/// spreadsheet columns, including the per-network `hubs needed` value
/// that is repeated across all rows of a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    #[serde(rename = "NETWORK_ID")]
    pub network: String,
    #[serde(rename = "STORE_ID")]
    pub store: String,
    #[serde(rename = "RANK")]
    pub rank: i64,
    #[serde(rename = "hubs needed")]
    pub hubs_needed: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    pub rows: Vec<CandidateRow>,
    /// Unit cost of letting a store exceed the hub cap.
    #[serde(rename = "relaxationCost")]
    pub relaxation_cost: f64,
    /// Maximum number of networks a store may serve as hub without relaxation.
    #[serde(rename = "hubCap", default = "default_hub_cap")]
    pub hub_cap: u32,
    /// Declared store set. Defaults to the distinct STORE_IDs in `rows`.
    #[serde(default)]
    pub stores: Option<Vec<String>>,
    /// Declared network set. Defaults to the distinct NETWORK_IDs in `rows`.
    #[serde(default)]
    pub networks: Option<Vec<String>>,
}
fn default_hub_cap() -> u32 {
    3
}

impl Problem {
    pub(crate) fn declared_stores(&self) -> BTreeSet<String> {
        match &self.stores {
            Some(stores) => stores.iter().cloned().collect(),
            None => self.rows.iter().map(|row| row.store.clone()).collect(),
        }
    }

    pub(crate) fn declared_networks(&self) -> BTreeSet<String> {
        match &self.networks {
            Some(networks) => networks.iter().cloned().collect(),
            None => self.rows.iter().map(|row| row.network.clone()).collect(),
        }
    }
}

/// The three-tier cost contract: any real rank < relaxation cost < naive
/// penalty. The solver prefers a documented low-rank assignment, falls back
/// to relaxation, and touches an undocumented pair only when nothing else
/// is feasible. The ordering is validated rather than assumed; see
/// [`crate::params::ParameterTables::check_cost_tiers`] for the rank side.
#[derive(Debug, Clone, Copy)]
pub struct CostSchedule {
    relaxation_cost: f64,
}

impl CostSchedule {
    /// Multiplier that lifts the relaxation cost to the sentinel penalty.
    pub const PENALTY_FACTOR: f64 = 10_000.0;

    pub fn new(relaxation_cost: f64) -> Result<Self, AllocationError> {
        if !relaxation_cost.is_finite() || relaxation_cost <= 0.0 {
            return Err(AllocationError::InvalidRelaxationCost(relaxation_cost));
        }
        Ok(Self { relaxation_cost })
    }

    pub fn relaxation_cost(&self) -> f64 {
        self.relaxation_cost
    }

    /// Cost charged for a (store, network) pair with no rank record.
    pub fn naive_penalty(&self) -> f64 {
        self.relaxation_cost * Self::PENALTY_FACTOR
    }
}

/// A store chosen as hub for one network.
#[derive(Debug, Clone, Serialize)]
pub struct HubChoice {
    pub store: String,
    pub rank: i64,
    /// Solver value of the assignment variable, near 1.0 for a clean pick.
    pub value: f64,
}

/// Solved assignment. Every declared network has an entry in `hubs`, even
/// when the solver selected no store for it (demand 0).
#[derive(Debug, Serialize)]
pub struct Assignment {
    pub hubs: BTreeMap<String, Vec<HubChoice>>,
    /// Stores that had to exceed the hub cap, with the amount of overage.
    pub relaxations: BTreeMap<String, f64>,
    pub objective: f64,
}
