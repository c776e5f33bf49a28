use good_lp::solvers::coin_cbc::{CoinCbcProblem, coin_cbc};
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, variable,
    variables,
};
use std::collections::{BTreeMap, BTreeSet};

pub mod error;
pub mod params;
pub mod report;
pub mod types;

pub use error::AllocationError;
pub use types::{Assignment, CandidateRow, CostSchedule, HubChoice, Problem};

use params::{ParameterTables, group_rows};

/// A variable value above this counts as "selected".
const SELECTION_THRESHOLD: f64 = 0.5;

/// How far an assignment variable may drift from 0 or 1 before the
/// continuous relaxation is considered to have produced a genuinely
/// fractional optimum.
const INTEGRALITY_TOLERANCE: f64 = 1e-5;

impl Problem {
    /// Runs the full pipeline: group rows, derive the parameter tables,
    /// assemble the LP, dispatch it to CBC and read the solution back as a
    /// discrete hub assignment.
    pub fn solve(&self) -> Result<Assignment, AllocationError> {
        let stores = self.declared_stores();
        let networks = self.declared_networks();
        let costs = CostSchedule::new(self.relaxation_cost)?;

        let index = group_rows(&self.rows);
        let tables = ParameterTables::build(&self.rows, &index, &stores, &networks)?;
        tables.check_cost_tiers(&costs)?;

        // Create all variables, and LUTs of type (store, network) → Variable
        let (variables, assignment_map, extra_map) = init_variables(&stores, &networks);

        let objective = build_objective(&assignment_map, &extra_map, &tables, &costs);
        let model = create_model(variables, objective.clone());

        // Add constraints
        let model = constrain_store_capacity(
            model,
            &stores,
            &networks,
            &assignment_map,
            &extra_map,
            self.hub_cap,
        );
        let model = constrain_network_demand(model, &stores, &networks, &assignment_map, &tables);

        // Solve. Infeasibility and unboundedness are surfaced as their own
        // categories; anything else is a solver failure, never an empty report.
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => return Err(AllocationError::Infeasible),
            Err(ResolutionError::Unbounded) => return Err(AllocationError::Unbounded),
            Err(other) => return Err(AllocationError::Solver(other.to_string())),
        };

        extract_assignment(
            &solution,
            &objective,
            &stores,
            &networks,
            &assignment_map,
            &extra_map,
            &tables,
            &costs,
        )
    }
}

type PairVariableMap = BTreeMap<(String, String), Variable>;
type StoreVariableMap = BTreeMap<String, Variable>;

fn init_variables(
    stores: &BTreeSet<String>,
    networks: &BTreeSet<String>,
) -> (ProblemVariables, PairVariableMap, StoreVariableMap) {
    let mut problem_vars = variables!();
    let mut assignment_map = BTreeMap::new();
    let mut extra_map = BTreeMap::new();

    for store in stores {
        for network in networks {
            // Continuous in [0, 1]. The capacity/demand system is
            // transportation-like, so optimal vertices land on 0/1; the
            // extraction step verifies that instead of trusting it.
            let assignment = problem_vars.add(variable().min(0).max(1));
            assignment_map.insert((store.clone(), network.clone()), assignment);
        }

        // Overage above the hub cap, charged at the relaxation cost.
        let extra = problem_vars.add(variable().min(0));
        extra_map.insert(store.clone(), extra);
    }

    (problem_vars, assignment_map, extra_map)
}

/// Minimize total rank of selected hubs plus the cost of any cap overage.
/// Undocumented pairs enter at the naive penalty, which keeps the model
/// feasible on sparse data while pricing those pairs out of any solution
/// that has a real alternative.
fn build_objective(
    assignment_map: &PairVariableMap,
    extra_map: &StoreVariableMap,
    tables: &ParameterTables,
    costs: &CostSchedule,
) -> Expression {
    let hub_cost = assignment_map.iter().fold(
        Expression::from(0.0),
        |sum, ((store, network), &assignment)| {
            sum + assignment * tables.rank_or_penalty(store, network, costs)
        },
    );

    extra_map
        .values()
        .fold(hub_cost, |sum, &extra| sum + extra * costs.relaxation_cost())
}

/// Create a model with the given objective function
fn create_model(variables: ProblemVariables, objective: Expression) -> CoinCbcProblem {
    #[allow(unused_mut)]
    let mut model = variables.minimise(objective).using(coin_cbc);
    #[cfg(not(debug_assertions))]
    model.set_parameter("loglevel", "0");
    model
}

/// For every store: Σ_n x[s,n] ≤ hub_cap + extra[s]
fn constrain_store_capacity<Model: SolverModel>(
    model: Model,
    stores: &BTreeSet<String>,
    networks: &BTreeSet<String>,
    assignment_map: &PairVariableMap,
    extra_map: &StoreVariableMap,
    hub_cap: u32,
) -> Model {
    stores.iter().fold(model, |m, store| {
        let zero = Expression::from(0.0);
        let assigned = networks
            .iter()
            .map(|network| assignment_map[&(store.clone(), network.clone())])
            .fold(zero, |sum, assignment| sum + assignment);
        let extra = extra_map[store];
        m.with((assigned - extra).leq(hub_cap as f64))
    })
}

/// For every network: Σ_s x[s,n] ≥ demand(n)
fn constrain_network_demand<Model: SolverModel>(
    model: Model,
    stores: &BTreeSet<String>,
    networks: &BTreeSet<String>,
    assignment_map: &PairVariableMap,
    tables: &ParameterTables,
) -> Model {
    networks.iter().fold(model, |m, network| {
        let zero = Expression::from(0.0);
        let assigned = stores
            .iter()
            .map(|store| assignment_map[&(store.clone(), network.clone())])
            .fold(zero, |sum, assignment| sum + assignment);
        m.with(assigned.geq(tables.demand(network) as f64))
    })
}

fn is_near_integral(value: f64) -> bool {
    value.abs() <= INTEGRALITY_TOLERANCE || (value - 1.0).abs() <= INTEGRALITY_TOLERANCE
}

/// Threshold the continuous solution into discrete hub picks. Every
/// assignment variable must round cleanly; a materially fractional value
/// escalates instead of being silently dropped by the 0.5 threshold.
/// Relaxation variables are legitimately fractional and are reported as-is.
#[allow(clippy::too_many_arguments)]
fn extract_assignment<S: Solution>(
    solution: &S,
    objective: &Expression,
    stores: &BTreeSet<String>,
    networks: &BTreeSet<String>,
    assignment_map: &PairVariableMap,
    extra_map: &StoreVariableMap,
    tables: &ParameterTables,
    costs: &CostSchedule,
) -> Result<Assignment, AllocationError> {
    let mut hubs = BTreeMap::new();
    for network in networks {
        let mut chosen = Vec::new();
        for store in stores {
            let value = solution.value(assignment_map[&(store.clone(), network.clone())]);
            if !is_near_integral(value) {
                return Err(AllocationError::FractionalAssignment {
                    store: store.clone(),
                    network: network.clone(),
                    value,
                });
            }
            if value > SELECTION_THRESHOLD {
                // A selected sentinel pair reports the penalty as its rank,
                // which makes undocumented picks obvious in the report.
                let rank = tables
                    .rank(store, network)
                    .unwrap_or_else(|| costs.naive_penalty() as i64);
                chosen.push(HubChoice {
                    store: store.clone(),
                    rank,
                    value,
                });
            }
        }
        hubs.insert(network.clone(), chosen);
    }

    let mut relaxations = BTreeMap::new();
    for store in stores {
        let value = solution.value(extra_map[store]);
        if value > SELECTION_THRESHOLD {
            relaxations.insert(store.clone(), value);
        }
    }

    Ok(Assignment {
        hubs,
        relaxations,
        objective: objective.eval_with(solution),
    })
}
