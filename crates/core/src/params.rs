//! Hyperparameter grid specification, expansion, and the `key=value;...`
//! wire format shared by the master, the workers, and the dump export.
//!
//! Range expansion follows arange semantics: `start, start+step, ...` for
//! every point strictly below `end + step`, so both endpoints land in the
//! set when the step divides the range evenly. Ranges that do not divide
//! evenly are implementation-defined (float accumulation decides the last
//! point) and deliberately not special-cased.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GauntletError;

// ── Values ────────────────────────────────────────────────────────

/// A scalar parameter value: integer, float, or bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Cast a string to the narrowest matching type: int first, then
    /// float, falling back to the string itself.
    pub fn cast(raw: &str) -> ParamValue {
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return ParamValue::Float(f);
        }
        ParamValue::Str(raw.to_string())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => {
                let s = format!("{}", v);
                // Whole floats keep their decimal point so a parse of the
                // rendered value yields a float again, not an integer.
                if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("nan") {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{}.0", s)
                }
            }
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

// ── Specifications ────────────────────────────────────────────────

/// A parameter as declared in the grid: a single fixed value or a
/// numeric range. Range bounds and step share one numeric type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterSpec {
    Value(ParamValue),
    IntRange { start: i64, end: i64, step: i64 },
    FloatRange { start: f64, end: f64, step: f64 },
}

impl ParameterSpec {
    /// Expand to the ordered set of concrete values.
    pub fn values(&self) -> Vec<ParamValue> {
        match self {
            ParameterSpec::Value(v) => vec![v.clone()],
            ParameterSpec::IntRange { start, end, step } => {
                let mut values = Vec::new();
                let stop = end + step;
                let mut v = *start;
                while v < stop {
                    values.push(ParamValue::Int(v));
                    v += step;
                }
                values
            }
            ParameterSpec::FloatRange { start, end, step } => {
                let mut values = Vec::new();
                let stop = end + step;
                let mut v = *start;
                while v < stop {
                    values.push(ParamValue::Float(v));
                    v += step;
                }
                values
            }
        }
    }
}

/// Parameter grid in declaration order.
pub type ParameterGrid = IndexMap<String, ParameterSpec>;

// ── Text format parsing ───────────────────────────────────────────

/// Parse a parameter grid file: one parameter per line, fields separated
/// by whitespace. Two fields declare a fixed value, four declare a range
/// (`name start end step`). `#` starts a comment; blank lines are skipped.
///
/// Malformed lines and invalid ranges fail here, before any entity is
/// created or worker contacted.
pub fn parse_parameters(text: &str) -> Result<ParameterGrid, GauntletError> {
    let mut grid = ParameterGrid::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.len() {
            2 => {
                grid.insert(fields[0].to_string(), ParameterSpec::Value(ParamValue::cast(fields[1])));
            }
            4 => {
                let spec = parse_range(&fields)?;
                grid.insert(fields[0].to_string(), spec);
            }
            _ => {
                return Err(GauntletError::InvalidParameter(format!(
                    "invalid parameter specification at: {}",
                    line
                )));
            }
        }
    }
    Ok(grid)
}

fn parse_range(fields: &[&str]) -> Result<ParameterSpec, GauntletError> {
    let invalid = || {
        GauntletError::InvalidParameter(format!(
            "invalid parameter range for {}: <{}, {}, {}>",
            fields[0], fields[1], fields[2], fields[3]
        ))
    };

    let start = ParamValue::cast(fields[1]);
    let end = ParamValue::cast(fields[2]);
    let step = ParamValue::cast(fields[3]);

    match (start, end, step) {
        (ParamValue::Int(start), ParamValue::Int(end), ParamValue::Int(step)) => {
            if end >= start && step > 0 {
                Ok(ParameterSpec::IntRange { start, end, step })
            } else {
                Err(invalid())
            }
        }
        (ParamValue::Float(start), ParamValue::Float(end), ParamValue::Float(step)) => {
            if end >= start && step > 0.0 {
                Ok(ParameterSpec::FloatRange { start, end, step })
            } else {
                Err(invalid())
            }
        }
        _ => Err(invalid()),
    }
}

/// Parse a requirements file: one specifier per line, `#` comments and
/// blank lines stripped, result sorted.
pub fn parse_requirements(text: &str) -> Vec<String> {
    let mut requirements: Vec<String> = text
        .lines()
        .filter_map(|line| {
            let requirement = line.split('#').next().unwrap_or("").trim();
            if requirement.is_empty() {
                None
            } else {
                Some(requirement.to_string())
            }
        })
        .collect();
    requirements.sort();
    requirements
}

// ── Parameter strings ─────────────────────────────────────────────

/// Serialize an assignment to `key1=val1;key2=val2` in map order.
pub fn parameter_string(assignment: &IndexMap<String, ParamValue>) -> String {
    assignment
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a `key1=val1;key2=val2` string back into a typed assignment,
/// preserving key order.
pub fn parse_parameter_string(s: &str) -> Result<IndexMap<String, ParamValue>, GauntletError> {
    let mut assignment = IndexMap::new();
    if s.is_empty() {
        return Ok(assignment);
    }
    for pair in s.split(';') {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            GauntletError::InvalidParameter(format!("invalid parameter pair: {}", pair))
        })?;
        assignment.insert(key.to_string(), ParamValue::cast(value));
    }
    Ok(assignment)
}

// ── Grid expansion ────────────────────────────────────────────────

/// One concrete (dataset, parameter assignment) pair to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSetting {
    pub dataset_name: String,
    pub parameters: String,
}

/// Expand a grid into the full cross-product of parameter assignments,
/// combined with every dataset name. Output size is
/// `datasets × Π(value-set cardinality)`.
pub fn generate_experiment_settings(
    datasets: &[String],
    grid: &ParameterGrid,
) -> Vec<ExperimentSetting> {
    // Cross-product over parameter value sets, keys in encounter order.
    let mut combinations: Vec<Vec<ParamValue>> = vec![Vec::new()];
    for spec in grid.values() {
        let values = spec.values();
        let mut next = Vec::with_capacity(combinations.len() * values.len());
        for combination in &combinations {
            for value in &values {
                let mut extended = combination.clone();
                extended.push(value.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }

    let parameter_strings: Vec<String> = combinations
        .into_iter()
        .map(|values| {
            let assignment: IndexMap<String, ParamValue> = grid
                .keys()
                .cloned()
                .zip(values)
                .collect();
            parameter_string(&assignment)
        })
        .collect();

    let mut settings = Vec::with_capacity(datasets.len() * parameter_strings.len());
    for dataset in datasets {
        for parameters in &parameter_strings {
            settings.push(ExperimentSetting {
                dataset_name: dataset.clone(),
                parameters: parameters.clone(),
            });
        }
    }
    settings
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> ParameterGrid {
        parse_parameters(text).unwrap()
    }

    #[test]
    fn casts_narrow_first() {
        assert_eq!(ParamValue::cast("1"), ParamValue::Int(1));
        assert_eq!(ParamValue::cast("12.0"), ParamValue::Float(12.0));
        assert_eq!(ParamValue::cast("12a"), ParamValue::Str("12a".to_string()));
        assert_eq!(ParamValue::cast("12a.0"), ParamValue::Str("12a.0".to_string()));
    }

    #[test]
    fn whole_floats_keep_their_decimal_point() {
        assert_eq!(ParamValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ParamValue::Float(2.5).to_string(), "2.5");
        assert_eq!(ParamValue::cast(&ParamValue::Float(1.0).to_string()), ParamValue::Float(1.0));
    }

    #[test]
    fn parses_values_ranges_and_comments() {
        let grid = grid("seed 42\n# a comment\nk 1 3 1  # inline\n\nkernel rbf\n");
        assert_eq!(grid.len(), 3);
        assert_eq!(grid["seed"], ParameterSpec::Value(ParamValue::Int(42)));
        assert_eq!(grid["k"], ParameterSpec::IntRange { start: 1, end: 3, step: 1 });
        assert_eq!(
            grid["kernel"],
            ParameterSpec::Value(ParamValue::Str("rbf".to_string()))
        );
    }

    #[test]
    fn range_validation_fails_fast() {
        assert!(parse_parameters("k 10 1 1").is_err());
        assert!(parse_parameters("k 1 10 0").is_err());
        assert!(parse_parameters("k a b c").is_err());
        assert!(parse_parameters("k 1 10.0 1").is_err());
        assert!(parse_parameters("k 1 10").is_err());
    }

    #[test]
    fn ranges_include_both_endpoints_on_even_division() {
        let spec = ParameterSpec::IntRange { start: 1, end: 3, step: 1 };
        assert_eq!(
            spec.values(),
            vec![ParamValue::Int(1), ParamValue::Int(2), ParamValue::Int(3)]
        );

        let spec = ParameterSpec::FloatRange { start: 0.25, end: 0.75, step: 0.25 };
        assert_eq!(
            spec.values(),
            vec![
                ParamValue::Float(0.25),
                ParamValue::Float(0.5),
                ParamValue::Float(0.75)
            ]
        );
    }

    #[test]
    fn parameter_string_round_trips() {
        let mut assignment = IndexMap::new();
        assignment.insert("a".to_string(), ParamValue::Int(10));
        assignment.insert("b".to_string(), ParamValue::Str("hello".to_string()));
        assignment.insert("c".to_string(), ParamValue::Float(0.5));

        let serialized = parameter_string(&assignment);
        assert_eq!(serialized, "a=10;b=hello;c=0.5");
        assert_eq!(parse_parameter_string(&serialized).unwrap(), assignment);

        assert!(parse_parameter_string("").unwrap().is_empty());
    }

    #[test]
    fn expansion_size_is_datasets_times_grid_product() {
        let grid = grid("seed 42\nk 1 3 1\nn 2 4 2\n");
        let datasets = vec!["shuttle".to_string(), "mulcross".to_string()];
        let settings = generate_experiment_settings(&datasets, &grid);
        // 2 datasets x (1 x 3 x 2) combinations
        assert_eq!(settings.len(), 12);
    }

    #[test]
    fn fixed_value_contributes_one_combination() {
        let grid = grid("seed 42\nk 1 3 1\n");
        let datasets = vec!["shuttle".to_string(), "mulcross".to_string()];
        // 2 datasets x (1 x 3) combinations
        assert_eq!(generate_experiment_settings(&datasets, &grid).len(), 6);
    }

    #[test]
    fn expansion_keeps_encounter_order_and_dataset_major_order() {
        let grid = grid("seed 42\nk 1 2 1\n");
        let datasets = vec!["a".to_string(), "b".to_string()];
        let settings = generate_experiment_settings(&datasets, &grid);
        assert_eq!(
            settings,
            vec![
                ExperimentSetting { dataset_name: "a".into(), parameters: "seed=42;k=1".into() },
                ExperimentSetting { dataset_name: "a".into(), parameters: "seed=42;k=2".into() },
                ExperimentSetting { dataset_name: "b".into(), parameters: "seed=42;k=1".into() },
                ExperimentSetting { dataset_name: "b".into(), parameters: "seed=42;k=2".into() },
            ]
        );
    }

    #[test]
    fn empty_grid_yields_one_empty_assignment() {
        let settings = generate_experiment_settings(&["a".to_string()], &ParameterGrid::new());
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].parameters, "");
    }

    #[test]
    fn requirements_are_sorted_and_stripped() {
        let requirements = parse_requirements("scipy>=1.4\n# dev only\nnumpy  # pinned\n\npyod\n");
        assert_eq!(requirements, vec!["numpy", "pyod", "scipy>=1.4"]);
    }
}
