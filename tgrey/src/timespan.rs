use pest::Parser;
use pest_derive::*;

#[derive(Parser)]
#[grammar = "timespan.pest"]
struct TimespanParser;

/// Convert a string of number/suffix chunks like "90d" or "1h30m" into a
/// count of seconds. Suffixes are y, w, d, h, m, s, case-insensitive; a
/// missing or unrecognized suffix counts the number as seconds. Anything
/// that does not parse as a timespan at all comes back as 0.
pub fn parse_timespan(value: &str) -> u64 {
	let timespan = match TimespanParser::parse(Rule::timespan, value) {
		Ok(mut pairs) => match pairs.next() {
			Some(timespan) => timespan,
			None => return 0,
		},
		Err(_) => return 0,
	};

	let mut total: u64 = 0;
	for entry in timespan.into_inner() {
		if entry.as_rule() != Rule::entry {
			continue;
		}

		let mut number: u64 = 0;
		let mut unit = 's';
		for part in entry.into_inner() {
			match part.as_rule() {
				Rule::number => {
					number = match part.as_str().parse() {
						Ok(number) => number,
						Err(_) => return 0,
					}
				}
				Rule::unit => unit = part.as_str().chars().next().unwrap_or('s'),
				_ => {}
			}
		}

		let multiplier = match unit.to_ascii_lowercase() {
			'y' => 31_536_000,
			'w' => 604_800,
			'd' => 86_400,
			'h' => 3_600,
			'm' => 60,
			_ => 1,
		};

		total = match number
			.checked_mul(multiplier)
			.and_then(|seconds| total.checked_add(seconds))
		{
			Some(total) => total,
			None => return 0,
		};
	}

	total
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn single_units() {
		assert_eq!(parse_timespan("1y"), 31_536_000);
		assert_eq!(parse_timespan("1w"), 604_800);
		assert_eq!(parse_timespan("1d"), 86_400);
		assert_eq!(parse_timespan("1h"), 3_600);
		assert_eq!(parse_timespan("5m"), 300);
		assert_eq!(parse_timespan("45s"), 45);
	}

	#[test]
	fn compound() {
		assert_eq!(parse_timespan("1h30m"), 5_400);
		assert_eq!(parse_timespan("1d12h"), 129_600);
	}

	#[test]
	fn case_insensitive() {
		assert_eq!(parse_timespan("1H30M"), 5_400);
		assert_eq!(parse_timespan("90D"), 7_776_000);
	}

	#[test]
	fn bare_number_is_seconds() {
		assert_eq!(parse_timespan("90"), 90);
	}

	#[test]
	fn unknown_unit_is_seconds() {
		assert_eq!(parse_timespan("5x"), 5);
	}

	#[test]
	fn garbage_is_zero() {
		assert_eq!(parse_timespan(""), 0);
		assert_eq!(parse_timespan("apples"), 0);
		assert_eq!(parse_timespan("m5"), 0);
		assert_eq!(parse_timespan("5m!"), 0);
	}

	#[test]
	fn overflow_is_zero() {
		assert_eq!(parse_timespan("99999999999999999999s"), 0);
		assert_eq!(parse_timespan("1000000000000000y"), 0);
	}
}
