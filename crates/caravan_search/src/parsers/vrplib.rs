use std::path::Path;

use geo::{Distance, Euclidean};
use tracing::warn;

use crate::{
    parsers::parser::{DatasetParser, ParseError, RoundFunc},
    problem::{
        location::{LocationBuilder, LocationIdx},
        matrix::Matrix,
        measure::MAX_VALUE,
        problem_data::{ProblemData, ProblemDataBuilder},
        vehicle_type::VehicleTypeBuilder,
    },
};

/// Parser for the tabular VRPLIB-style format: `KEY : VALUE` specifications
/// followed by `*_SECTION` blocks.
pub struct VrplibParser;

impl DatasetParser for VrplibParser {
    fn parse<P: AsRef<Path>>(
        &self,
        file: P,
        round_func: RoundFunc,
    ) -> Result<ProblemData, ParseError> {
        let file_content = std::fs::read_to_string(file)?;
        parse(&file_content, round_func)
    }
}

#[derive(Default)]
struct RawInstance {
    dimension: Option<usize>,
    capacity: Option<f64>,
    vehicles: Option<usize>,
    edge_weight_type: Option<String>,
    edge_weight_format: Option<String>,
    coords: Vec<Option<(f64, f64)>>,
    demands: Vec<f64>,
    pickups: Vec<f64>,
    time_windows: Vec<Option<(f64, f64)>>,
    service_times: Vec<f64>,
    release_times: Vec<f64>,
    prizes: Vec<f64>,
    depots: Vec<usize>,
    backhauls: Vec<bool>,
    edge_weights: Vec<f64>,
}

impl RawInstance {
    fn dimension(&self) -> Result<usize, ParseError> {
        self.dimension
            .ok_or_else(|| ParseError::Malformed(String::from("missing DIMENSION")))
    }
}

fn parse_number(value: &str) -> Result<f64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::Malformed(format!("invalid number: {value}")))
}

fn parse_index(value: &str) -> Result<usize, ParseError> {
    let number = parse_number(value)?;
    if number < 0.0 {
        return Err(ParseError::Malformed(format!("invalid index: {value}")));
    }
    Ok(number as usize)
}

/// Location ids in the file are 1-based.
fn parse_location_id(value: &str) -> Result<usize, ParseError> {
    let id = parse_index(value)?;
    if id == 0 {
        return Err(ParseError::Malformed(format!(
            "location ids are 1-based, got {value}"
        )));
    }
    Ok(id - 1)
}

pub fn parse(text: &str, round_func: RoundFunc) -> Result<ProblemData, ParseError> {
    let lines: Vec<&str> = text.lines().map(|line| line.trim()).collect();
    let mut raw = RawInstance::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.is_empty() || line == "EOF" {
            i += 1;
            continue;
        }

        // Specifications (KEY : VALUE).
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_uppercase();
            let value = value.trim();

            match key.as_str() {
                "DIMENSION" => {
                    let dimension = parse_index(value)?;
                    raw.dimension = Some(dimension);
                    raw.coords.resize(dimension, None);
                    raw.demands.resize(dimension, 0.0);
                    raw.pickups.resize(dimension, 0.0);
                    raw.time_windows.resize(dimension, None);
                    raw.service_times.resize(dimension, 0.0);
                    raw.release_times.resize(dimension, 0.0);
                    raw.prizes.resize(dimension, 0.0);
                    raw.backhauls.resize(dimension, false);
                }
                "CAPACITY" => raw.capacity = Some(parse_number(value)?),
                "VEHICLES" => raw.vehicles = Some(parse_index(value)?),
                "EDGE_WEIGHT_TYPE" => raw.edge_weight_type = Some(value.to_uppercase()),
                "EDGE_WEIGHT_FORMAT" => raw.edge_weight_format = Some(value.to_uppercase()),
                _ => {} // Other specifications carry no data we use.
            }

            i += 1;
            continue;
        }

        // Section blocks.
        if line.ends_with("SECTION") {
            let section = line.to_uppercase();
            let dimension = raw.dimension()?;
            i += 1;

            match section.as_str() {
                "NODE_COORD_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 3 {
                            raw.coords[location] =
                                Some((parse_number(parts[1])?, parse_number(parts[2])?));
                        }
                        Ok(())
                    })?;
                }
                "DEMAND_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 2 {
                            raw.demands[location] = parse_number(parts[1])?;
                        }
                        Ok(())
                    })?;
                }
                "PICKUP_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 2 {
                            raw.pickups[location] = parse_number(parts[1])?;
                        }
                        Ok(())
                    })?;
                }
                "TIME_WINDOW_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 3 {
                            raw.time_windows[location] =
                                Some((parse_number(parts[1])?, parse_number(parts[2])?));
                        }
                        Ok(())
                    })?;
                }
                "SERVICE_TIME_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 2 {
                            raw.service_times[location] = parse_number(parts[1])?;
                        }
                        Ok(())
                    })?;
                }
                "RELEASE_TIME_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 2 {
                            raw.release_times[location] = parse_number(parts[1])?;
                        }
                        Ok(())
                    })?;
                }
                "PRIZE_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        let location = parse_location_id(parts[0])?;
                        if location < dimension && parts.len() >= 2 {
                            raw.prizes[location] = parse_number(parts[1])?;
                        }
                        Ok(())
                    })?;
                }
                "BACKHAUL_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        for part in parts {
                            let location = parse_location_id(part)?;
                            if location < dimension {
                                raw.backhauls[location] = true;
                            }
                        }
                        Ok(())
                    })?;
                }
                "DEPOT_SECTION" => {
                    while i < lines.len() && lines[i] != "-1" && lines[i] != "EOF" {
                        if !lines[i].is_empty() {
                            raw.depots.push(parse_index(lines[i])?);
                        }
                        i += 1;
                    }
                    if i < lines.len() && lines[i] == "-1" {
                        i += 1;
                    }
                }
                "EDGE_WEIGHT_SECTION" => {
                    i = scan_rows(&lines, i, |parts| {
                        for part in parts {
                            raw.edge_weights.push(parse_number(part)?);
                        }
                        Ok(())
                    })?;
                }
                _ => return Err(ParseError::UnknownSection(line.to_owned())),
            }

            continue;
        }

        return Err(ParseError::Malformed(format!("unexpected line: {line}")));
    }

    build_problem(raw, round_func)
}

/// Consumes data rows until the next section header, EOF marker, or
/// specification line. Returns the index of the first unconsumed line.
fn scan_rows<'a, F>(lines: &[&'a str], mut i: usize, mut row: F) -> Result<usize, ParseError>
where
    F: FnMut(&[&'a str]) -> Result<(), ParseError>,
{
    while i < lines.len()
        && !lines[i].ends_with("SECTION")
        && lines[i] != "EOF"
        && !lines[i].contains(':')
    {
        if !lines[i].is_empty() {
            let parts: Vec<&str> = lines[i].split_whitespace().collect();
            row(&parts)?;
        }
        i += 1;
    }

    Ok(i)
}

fn build_problem(raw: RawInstance, round_func: RoundFunc) -> Result<ProblemData, ParseError> {
    let dimension = raw.dimension()?;

    // Depot bookkeeping: the file uses 1-based indices, the canonical first
    // location must be a depot, and depots occupy a contiguous prefix.
    let depots = if raw.depots.is_empty() {
        vec![1]
    } else {
        raw.depots.clone()
    };

    if depots[0] != 1 {
        return Err(ParseError::DepotNotFirst);
    }
    for (offset, &depot) in depots.iter().enumerate() {
        if depot != offset + 1 {
            return Err(ParseError::DepotsNotContiguous);
        }
    }

    let num_depots = depots.len();
    let num_clients = dimension - num_depots;

    // Distance matrix, either explicit or from rounded Euclidean pairs.
    let edge_weight_type = raw
        .edge_weight_type
        .clone()
        .unwrap_or_else(|| String::from("EUC_2D"));

    let mut distances = match edge_weight_type.as_str() {
        "EUC_2D" => {
            if !raw.edge_weights.is_empty() {
                return Err(ParseError::Malformed(String::from(
                    "EDGE_WEIGHT_SECTION requires EDGE_WEIGHT_TYPE EXPLICIT",
                )));
            }

            let mut points = Vec::with_capacity(dimension);
            for (location, coord) in raw.coords.iter().enumerate() {
                let (x, y) = coord.ok_or_else(|| {
                    ParseError::Malformed(format!("missing coordinates for location {location}"))
                })?;
                points.push(geo::Point::new(x, y));
            }

            let mut matrix = Matrix::zeros(dimension);
            for (from, &from_point) in points.iter().enumerate() {
                for (to, &to_point) in points.iter().enumerate() {
                    if from != to {
                        let distance = Euclidean.distance(from_point, to_point);
                        matrix.set(
                            LocationIdx::new(from),
                            LocationIdx::new(to),
                            round_func.apply(distance),
                        );
                    }
                }
            }
            matrix
        }
        "EXPLICIT" => {
            let edge_weight_format = raw
                .edge_weight_format
                .clone()
                .unwrap_or_else(|| String::from("FULL_MATRIX"));
            if edge_weight_format != "FULL_MATRIX" {
                return Err(ParseError::UnknownEdgeWeightFormat(edge_weight_format));
            }

            if raw.edge_weights.len() != dimension * dimension {
                return Err(ParseError::IncompleteEdgeWeights {
                    actual: raw.edge_weights.len(),
                    expected: dimension * dimension,
                });
            }

            Matrix::from_flat(
                raw.edge_weights
                    .iter()
                    .map(|&weight| round_func.apply(weight))
                    .collect(),
                dimension,
            )
        }
        _ => return Err(ParseError::UnknownEdgeWeightType(edge_weight_type)),
    };

    if distances.max_entry() > MAX_VALUE {
        warn!(
            "matrix entries exceed {MAX_VALUE}; costs will be capped and comparisons may degrade"
        );
    }

    // Backhaul clients may only be served after all linehaul clients; the
    // sentinel prices out depot -> backhaul and backhaul -> linehaul arcs.
    let has_backhauls = raw.backhauls.iter().any(|&backhaul| backhaul);
    if has_backhauls {
        for location in 0..dimension {
            if !raw.backhauls[location] {
                continue;
            }
            let backhaul = LocationIdx::new(location);

            for depot in 0..num_depots {
                distances.set(LocationIdx::new(depot), backhaul, MAX_VALUE);
            }
            for other in num_depots..dimension {
                if !raw.backhauls[other] && other != location {
                    distances.set(backhaul, LocationIdx::new(other), MAX_VALUE);
                }
            }
        }
    }

    // In this format, travel time equals travel distance.
    let durations = distances.clone();

    let mut depot_locations = Vec::with_capacity(num_depots);
    let mut client_locations = Vec::with_capacity(num_clients);

    for location in 0..dimension {
        let mut builder = LocationBuilder::default();

        if let Some((x, y)) = raw.coords[location] {
            builder.set_coords(round_func.apply(x), round_func.apply(y));
        }

        if let Some((early, late)) = raw.time_windows[location] {
            let early = round_func.apply(early);
            let late = round_func.apply(late);
            if early > late {
                return Err(ParseError::TimeWindowOpenAfterClose { location });
            }
            builder.set_time_window(early, late);
        }

        builder.set_name(format!("{location}"));

        if location < num_depots {
            depot_locations.push(builder.build());
        } else {
            let demand = round_func.apply(raw.demands[location]);
            let pickup = round_func.apply(raw.pickups[location]);
            if raw.backhauls[location] {
                // A backhaul client's demand is collected, not delivered.
                builder.set_pickup(demand.max(pickup));
            } else {
                builder.set_delivery(demand);
                builder.set_pickup(pickup);
            }

            builder.set_service_duration(round_func.apply(raw.service_times[location]));
            builder.set_release_time(round_func.apply(raw.release_times[location]));

            let prize = round_func.apply(raw.prizes[location]);
            builder.set_prize(prize);
            builder.set_required(prize == 0);

            client_locations.push(builder.build());
        }
    }

    // One vehicle type per depot; the fleet is split evenly across depots.
    let num_vehicles = raw.vehicles.unwrap_or(num_clients).max(1);
    let capacity = raw
        .capacity
        .map(|capacity| round_func.apply(capacity))
        .unwrap_or(MAX_VALUE);

    let per_depot = num_vehicles / num_depots;
    let remainder = num_vehicles % num_depots;
    let vehicle_types = (0..num_depots)
        .map(|depot| {
            let mut builder = VehicleTypeBuilder::default();
            builder
                .set_capacity(capacity)
                .set_depot(LocationIdx::new(depot))
                .set_num_available((per_depot + usize::from(depot < remainder)).max(1))
                .set_name(format!("depot {depot}"));
            builder.build()
        })
        .collect();

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(depot_locations);
    builder.set_clients(client_locations);
    builder.set_vehicle_types(vehicle_types);
    builder.set_distances(distances);
    builder.set_durations(durations);

    Ok(builder.build()?)
}
