//! Submission validation
//!
//! Parameters arrive as an untyped JSON object. Each field is checked against
//! [`FIELD_RULES`] in table order and the first failure is reported, so the
//! caller always learns which single field to fix.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::simulation::SimulationParams;

/// A rejected submission
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Canonical name of the offending field, absent when the body itself is malformed
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    fn field(name: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(name.to_string()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
}

/// Bounds and default for one parameter
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    /// Descriptive spelling also accepted on input
    pub alias: Option<&'static str>,
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// Inclusive bounds for every parameter, in reporting order
pub const FIELD_RULES: [FieldRule; 6] = [
    FieldRule {
        name: "nx",
        alias: Some("gridWidth"),
        kind: FieldKind::Integer,
        min: 10.0,
        max: 200.0,
        default: 50.0,
    },
    FieldRule {
        name: "ny",
        alias: Some("gridHeight"),
        kind: FieldKind::Integer,
        min: 10.0,
        max: 200.0,
        default: 50.0,
    },
    FieldRule {
        name: "reynoldsNumber",
        alias: Some("flowNumber"),
        kind: FieldKind::Real,
        min: 1.0,
        max: 10000.0,
        default: 100.0,
    },
    FieldRule {
        name: "steps",
        alias: None,
        kind: FieldKind::Integer,
        min: 10.0,
        max: 5000.0,
        default: 500.0,
    },
    FieldRule {
        name: "dt",
        alias: None,
        kind: FieldKind::Real,
        min: 0.0001,
        max: 0.1,
        default: 0.01,
    },
    FieldRule {
        name: "lidVelocity",
        alias: Some("boundaryVelocity"),
        kind: FieldKind::Real,
        min: -10.0,
        max: 10.0,
        default: 1.0,
    },
];

impl FieldRule {
    fn lookup<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a Value> {
        body.get(self.name)
            .or_else(|| self.alias.and_then(|alias| body.get(alias)))
    }

    fn check(&self, value: Option<&Value>) -> Result<f64, ValidationError> {
        let number = match value {
            None | Some(Value::Null) => return Ok(self.default),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                ValidationError::field(self.name, "Expected number, received nan")
            })?,
            Some(other) => {
                return Err(ValidationError::field(
                    self.name,
                    format!("Expected number, received {}", json_type_name(other)),
                ));
            }
        };

        if self.kind == FieldKind::Integer && number.fract() != 0.0 {
            return Err(ValidationError::field(
                self.name,
                "Expected integer, received float",
            ));
        }
        if number < self.min {
            return Err(ValidationError::field(
                self.name,
                format!("Number must be greater than or equal to {}", self.min),
            ));
        }
        if number > self.max {
            return Err(ValidationError::field(
                self.name,
                format!("Number must be less than or equal to {}", self.max),
            ));
        }

        Ok(number)
    }
}

/// Validates a raw submission body and applies defaults for missing fields
///
/// Unknown keys are ignored.
pub fn validate_request(body: &Value) -> Result<SimulationParams, ValidationError> {
    let Value::Object(map) = body else {
        return Err(ValidationError {
            field: None,
            message: format!("Expected object, received {}", json_type_name(body)),
        });
    };

    let mut values = [0.0f64; FIELD_RULES.len()];
    for (slot, rule) in values.iter_mut().zip(FIELD_RULES.iter()) {
        *slot = rule.check(rule.lookup(map))?;
    }

    // Integer fields are whole and within u32 range after the checks above
    Ok(SimulationParams {
        nx: values[0] as u32,
        ny: values[1] as u32,
        reynolds_number: values[2],
        steps: values[3] as u32,
        dt: values[4],
        lid_velocity: values[5],
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
