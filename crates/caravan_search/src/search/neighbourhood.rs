use serde::{Deserialize, Serialize};

use crate::problem::{location::LocationIdx, problem_data::ProblemData};

/// Granular-neighbourhood parameters. Proximity weights are in tenths so the
/// computation stays in integers: the defaults correspond to weighting
/// minimum wait time at 0.2 and minimum time warp at 1.0 against distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighbourhoodParams {
    pub weight_wait_time: i64,
    pub weight_time_warp: i64,
    pub nb_granular: usize,
    pub symmetric_proximity: bool,
    pub symmetric_neighbours: bool,
}

impl Default for NeighbourhoodParams {
    fn default() -> Self {
        NeighbourhoodParams {
            weight_wait_time: 2,
            weight_time_warp: 10,
            nb_granular: 40,
            symmetric_proximity: true,
            symmetric_neighbours: false,
        }
    }
}

/// For each location, an ordered bounded list of candidate partner clients.
/// Depots have empty lists and appear in no list.
pub type NeighbourLists = Vec<Vec<LocationIdx>>;

/// Ranks, per client, all other clients by a combined distance/time
/// proximity and truncates to `nb_granular`. Built once per problem and
/// shared read-only for the whole search.
pub fn compute_neighbours(data: &ProblemData, params: &NeighbourhoodParams) -> NeighbourLists {
    let num_locations = data.num_locations();
    let mut proximity = vec![0i64; num_locations * num_locations];

    for i in data.clients() {
        let early_i = data.location(i).tw_early();
        let late_i = data.location(i).tw_late();
        let service_i = data.location(i).service_duration();

        for j in data.clients() {
            if i == j {
                continue;
            }

            let early_j = data.location(j).tw_early();
            let late_j = data.location(j).tw_late();
            let travel = data.duration(i, j);

            // Waiting if we leave i as late as possible; warp if we leave as
            // early as possible.
            let min_wait = early_j
                .saturating_sub(travel)
                .saturating_sub(service_i)
                .saturating_sub(late_i)
                .max(0);
            let min_warp = early_i
                .saturating_add(service_i)
                .saturating_add(travel)
                .saturating_sub(late_j)
                .max(0);

            proximity[i.get() * num_locations + j.get()] = data
                .dist(i, j)
                .saturating_mul(10)
                .saturating_add(params.weight_wait_time.saturating_mul(min_wait))
                .saturating_add(params.weight_time_warp.saturating_mul(min_warp));
        }
    }

    if params.symmetric_proximity {
        for i in 0..num_locations {
            for j in i + 1..num_locations {
                let forward = proximity[i * num_locations + j];
                let backward = proximity[j * num_locations + i];
                let symmetric = forward.min(backward);
                proximity[i * num_locations + j] = symmetric;
                proximity[j * num_locations + i] = symmetric;
            }
        }
    }

    let mut neighbours: NeighbourLists = vec![Vec::new(); num_locations];

    for i in data.clients() {
        let mut ranked: Vec<(i64, LocationIdx)> = data
            .clients()
            .filter(|&j| j != i)
            .map(|j| (proximity[i.get() * num_locations + j.get()], j))
            .collect();

        ranked.sort_unstable_by_key(|&(proximity, j)| (proximity, j));
        ranked.truncate(params.nb_granular);
        neighbours[i.get()] = ranked.into_iter().map(|(_, j)| j).collect();
    }

    if params.symmetric_neighbours {
        for i in data.clients() {
            for position in 0..neighbours[i.get()].len() {
                let j = neighbours[i.get()][position];
                if !neighbours[j.get()].contains(&i) {
                    neighbours[j.get()].push(i);
                }
            }
        }
    }

    neighbours
}
