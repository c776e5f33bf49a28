//! Failure categories of the allocation pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocationError {
    /// The relaxation cost must be a positive finite number; everything in
    /// the cost schedule is derived from it.
    #[error("relaxation cost must be positive and finite, got {0}")]
    InvalidRelaxationCost(f64),

    /// A real rank reached the relaxation cost, which would let the solver
    /// prefer relaxation over a documented assignment.
    #[error(
        "rank {rank} for store {store} in network {network} is not below the \
         relaxation cost {relaxation_cost}; cost tiers require rank < relaxation < penalty"
    )]
    CostTierViolation {
        store: String,
        network: String,
        rank: i64,
        relaxation_cost: f64,
    },

    /// A declared network has no row carrying its `hubs needed` value.
    #[error("network {0} has no demand record")]
    MissingDemand(String),

    /// The solver proved the model infeasible. With the relaxation variables
    /// in place this points at a structural data problem, e.g. a network
    /// demanding more hubs than there are declared stores.
    #[error("the assignment model is infeasible even after cap relaxation")]
    Infeasible,

    /// The solver proved the model unbounded. Should not happen with the
    /// [0,1] variable bounds; indicates a malformed model.
    #[error("the assignment model is unbounded")]
    Unbounded,

    /// The solver itself failed (crashed, unreachable, internal error).
    /// Distinct from [`AllocationError::Infeasible`] on purpose.
    #[error("solver failure: {0}")]
    Solver(String),

    /// An assignment variable came back materially fractional, so rounding
    /// through the 0.5 threshold would misreport the optimum.
    #[error(
        "assignment of store {store} to network {network} solved to the \
         fractional value {value}; the relaxed model did not round cleanly"
    )]
    FractionalAssignment {
        store: String,
        network: String,
        value: f64,
    },
}
