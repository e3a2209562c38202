use std::sync::Arc;

use anyhow::{Context, bail};
use caravan_search::{
    parsers::{InstanceFormat, RoundFunc, read},
    problem::problem_data::ProblemData,
    search::{
        CostEvaluator, LocalSearch, NeighbourhoodParams, SearchBudget, SearchParams, Solution,
        compute_neighbours,
        ops::{Exchange10, Exchange11, Exchange20, MoveTwoClientsReversed, TwoOpt},
    },
};
use jiff::SignedDuration;
use mimalloc::MiMalloc;
use tracing::{Level, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Fills vehicles greedily in client order, opening a new route whenever the
/// current one would run out of capacity. Good enough as a starting point
/// for the local search.
fn initial_solution(data: &ProblemData) -> anyhow::Result<Solution> {
    let mut lists: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut load = 0;

    let capacity = data
        .vehicle_types()
        .iter()
        .map(|vehicle_type| vehicle_type.capacity())
        .max()
        .context("instance has no vehicles")?;
    let num_vehicles = data.num_vehicles();

    for client in data.clients() {
        let delivery = data.location(client).delivery();

        let out_of_capacity = load + delivery > capacity && !current.is_empty();
        let can_open_route = lists.len() + 1 < num_vehicles;
        if out_of_capacity && can_open_route {
            lists.push(std::mem::take(&mut current));
            load = 0;
        }

        current.push(client.get());
        load += delivery;
    }

    if !current.is_empty() {
        lists.push(current);
    }

    Ok(Solution::from_route_lists(data, &lists)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: caravan <instance> [vrplib|solomon] [round_func]")?;
    let format = match args.next().as_deref() {
        Some("solomon") => InstanceFormat::Solomon,
        Some("vrplib") | None => InstanceFormat::Vrplib,
        Some(other) => bail!("unknown instance format {other:?}"),
    };
    let round_func = match args.next() {
        Some(name) => RoundFunc::from_name(&name)?,
        None => RoundFunc::None,
    };

    let data = Arc::new(read(&path, format, round_func)?);
    info!(
        "{}: {} clients, {} vehicles over {} depots",
        path,
        data.num_clients(),
        data.num_vehicles(),
        data.num_depots()
    );

    let neighbours = caravan_search::timer_debug!(
        "compute_neighbours",
        compute_neighbours(&data, &NeighbourhoodParams::default())
    );
    let cost_evaluator = CostEvaluator::new(20, 6);

    let params = SearchParams {
        budget: SearchBudget::duration(SignedDuration::from_secs(30)),
        ..SearchParams::default()
    };
    let mut local_search = LocalSearch::with_params(Arc::clone(&data), neighbours, params);
    local_search.add_node_operator(Exchange10::new());
    local_search.add_node_operator(Exchange20::new());
    local_search.add_node_operator(Exchange11::new());
    local_search.add_node_operator(TwoOpt::new());
    local_search.add_node_operator(MoveTwoClientsReversed::new());

    let solution = initial_solution(&data)?;
    info!(
        "initial: {} routes, penalised cost {}",
        solution.num_routes(),
        cost_evaluator.penalised_cost(&solution)
    );

    let improved = local_search.search(&solution, &cost_evaluator);
    let statistics = local_search.statistics();

    info!(
        "improved: {} routes, penalised cost {} ({} moves over {} iterations in {:?}, converged: {})",
        improved.num_routes(),
        cost_evaluator.penalised_cost(&improved),
        statistics.moves_applied,
        statistics.iterations,
        statistics.elapsed,
        statistics.converged,
    );

    Ok(())
}
