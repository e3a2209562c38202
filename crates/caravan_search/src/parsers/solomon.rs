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

/// Parser for the Solomon VRPTW format: an instance name, a `VEHICLE` header
/// with fleet size and capacity, and a `CUSTOMER` table whose first row is
/// the depot. Travel time equals travel distance, both Euclidean.
pub struct SolomonParser;

impl DatasetParser for SolomonParser {
    fn parse<P: AsRef<Path>>(
        &self,
        file: P,
        round_func: RoundFunc,
    ) -> Result<ProblemData, ParseError> {
        let file_content = std::fs::read_to_string(file)?;
        parse(&file_content, round_func)
    }
}

struct CustomerRow {
    x: f64,
    y: f64,
    demand: f64,
    ready: f64,
    due: f64,
    service: f64,
}

pub fn parse(text: &str, round_func: RoundFunc) -> Result<ProblemData, ParseError> {
    let lines: Vec<&str> = text.lines().map(|line| line.trim()).collect();

    let vehicle_header = lines
        .iter()
        .position(|line| line.to_uppercase().starts_with("VEHICLE"))
        .ok_or_else(|| ParseError::Malformed(String::from("missing VEHICLE header")))?;

    // The first data row after the header carries fleet size and capacity.
    let (num_vehicles, capacity) = lines[vehicle_header + 1..]
        .iter()
        .find_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() == 2
                && let (Ok(number), Ok(capacity)) =
                    (parts[0].parse::<usize>(), parts[1].parse::<f64>())
            {
                Some((number, capacity))
            } else {
                None
            }
        })
        .ok_or_else(|| ParseError::Malformed(String::from("missing vehicle number and capacity")))?;

    let customer_header = lines
        .iter()
        .position(|line| line.to_uppercase().starts_with("CUSTOMER"))
        .ok_or_else(|| ParseError::Malformed(String::from("missing CUSTOMER table")))?;

    let mut rows = Vec::new();
    for line in &lines[customer_header + 1..] {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 7 || parts[0].parse::<usize>().is_err() {
            continue; // column header or blank line
        }

        let number = |value: &str| -> Result<f64, ParseError> {
            value
                .parse()
                .map_err(|_| ParseError::Malformed(format!("invalid number: {value}")))
        };

        rows.push(CustomerRow {
            x: number(parts[1])?,
            y: number(parts[2])?,
            demand: number(parts[3])?,
            ready: number(parts[4])?,
            due: number(parts[5])?,
            service: number(parts[6])?,
        });
    }

    if rows.len() < 2 {
        return Err(ParseError::Malformed(String::from(
            "expected a depot row and at least one customer",
        )));
    }

    let dimension = rows.len();
    let mut distances = Matrix::zeros(dimension);
    for (from, from_row) in rows.iter().enumerate() {
        let from_point = geo::Point::new(from_row.x, from_row.y);
        for (to, to_row) in rows.iter().enumerate() {
            if from != to {
                let to_point = geo::Point::new(to_row.x, to_row.y);
                distances.set(
                    LocationIdx::new(from),
                    LocationIdx::new(to),
                    round_func.apply(Euclidean.distance(from_point, to_point)),
                );
            }
        }
    }

    if distances.max_entry() > MAX_VALUE {
        warn!(
            "matrix entries exceed {MAX_VALUE}; costs will be capped and comparisons may degrade"
        );
    }

    let mut locations = Vec::with_capacity(dimension);
    for (index, row) in rows.iter().enumerate() {
        let early = round_func.apply(row.ready);
        let late = round_func.apply(row.due);
        if early > late {
            return Err(ParseError::TimeWindowOpenAfterClose { location: index });
        }

        let mut builder = LocationBuilder::default();
        builder
            .set_coords(round_func.apply(row.x), round_func.apply(row.y))
            .set_time_window(early, late)
            .set_name(format!("{index}"));

        if index > 0 {
            builder
                .set_delivery(round_func.apply(row.demand))
                .set_service_duration(round_func.apply(row.service));
        }

        locations.push(builder.build());
    }

    let clients = locations.split_off(1);

    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type
        .set_capacity(round_func.apply(capacity))
        .set_num_available(num_vehicles.max(1))
        .set_depot(LocationIdx::new(0));

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(locations);
    builder.set_clients(clients);
    builder.set_vehicle_types(vec![vehicle_type.build()]);
    builder.set_distances(distances.clone());
    builder.set_durations(distances);

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_SOLOMON: &str = "
TEST1

VEHICLE
NUMBER     CAPACITY
  2          50

CUSTOMER
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE TIME

    0      0         0          0          0       100          0
    1      3         4         10         10        50          5
    2      6         8         20          0        80          5
";

    #[test]
    fn test_parses_header_and_rows() {
        let data = parse(SMALL_SOLOMON, RoundFunc::None).unwrap();

        assert_eq!(data.num_depots(), 1);
        assert_eq!(data.num_clients(), 2);
        assert_eq!(data.num_vehicles(), 2);
        assert_eq!(data.vehicle_type(0.into()).capacity(), 50);

        let depot = data.location(LocationIdx::new(0));
        assert_eq!(depot.tw_early(), 0);
        assert_eq!(depot.tw_late(), 100);
        assert_eq!(depot.delivery(), 0);

        let client = data.location(LocationIdx::new(1));
        assert_eq!(client.delivery(), 10);
        assert_eq!(client.tw_early(), 10);
        assert_eq!(client.tw_late(), 50);
        assert_eq!(client.service_duration(), 5);
    }

    #[test]
    fn test_distances_are_rounded_euclidean() {
        let data = parse(SMALL_SOLOMON, RoundFunc::Round).unwrap();

        // (0,0) -> (3,4) is 5; (0,0) -> (6,8) is 10.
        assert_eq!(data.dist(LocationIdx::new(0), LocationIdx::new(1)), 5);
        assert_eq!(data.dist(LocationIdx::new(0), LocationIdx::new(2)), 10);
        assert_eq!(data.dist(LocationIdx::new(1), LocationIdx::new(2)), 5);
        assert_eq!(
            data.dist(LocationIdx::new(2), LocationIdx::new(1)),
            data.dist(LocationIdx::new(1), LocationIdx::new(2))
        );
        // Distance doubles as travel time.
        assert_eq!(data.duration(LocationIdx::new(0), LocationIdx::new(2)), 10);
    }

    #[test]
    fn test_dimacs_scaling() {
        let data = parse(SMALL_SOLOMON, RoundFunc::Dimacs).unwrap();

        assert_eq!(data.dist(LocationIdx::new(0), LocationIdx::new(1)), 50);
        assert_eq!(data.location(LocationIdx::new(1)).tw_early(), 100);
        assert_eq!(data.location(LocationIdx::new(1)).delivery(), 100);
    }

    #[test]
    fn test_missing_vehicle_header() {
        assert!(matches!(
            parse("NAME\nCUSTOMER\n0 0 0 0 0 10 0\n1 1 1 1 0 10 0", RoundFunc::None),
            Err(ParseError::Malformed(_))
        ));
    }
}
