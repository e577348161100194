//! Attribute queries over the drone roster.

use crate::error::{PlanError, PlanResult};
use crate::models::{Capabilities, Drone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Queryable capability fields, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneAttribute {
    Cooling,
    Heating,
    Capacity,
    MaxMoves,
    CostPerMove,
    CostInitial,
    CostFinal,
}

impl DroneAttribute {
    pub const ALL: [DroneAttribute; 7] = [
        DroneAttribute::Cooling,
        DroneAttribute::Heating,
        DroneAttribute::Capacity,
        DroneAttribute::MaxMoves,
        DroneAttribute::CostPerMove,
        DroneAttribute::CostInitial,
        DroneAttribute::CostFinal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DroneAttribute::Cooling => "cooling",
            DroneAttribute::Heating => "heating",
            DroneAttribute::Capacity => "capacity",
            DroneAttribute::MaxMoves => "maxMoves",
            DroneAttribute::CostPerMove => "costPerMove",
            DroneAttribute::CostInitial => "costInitial",
            DroneAttribute::CostFinal => "costFinal",
        }
    }

    pub fn value_of(&self, capability: &Capabilities) -> AttributeValue {
        match self {
            DroneAttribute::Cooling => AttributeValue::Bool(capability.cooling),
            DroneAttribute::Heating => AttributeValue::Bool(capability.heating),
            DroneAttribute::Capacity => AttributeValue::Float(capability.capacity),
            DroneAttribute::MaxMoves => AttributeValue::Int(capability.max_moves as i64),
            DroneAttribute::CostPerMove => AttributeValue::Float(capability.cost_per_move),
            DroneAttribute::CostInitial => AttributeValue::Float(capability.cost_initial),
            DroneAttribute::CostFinal => AttributeValue::Float(capability.cost_final),
        }
    }

    /// Parse `raw` as a value of this attribute's type.
    pub fn parse_value(&self, raw: &str) -> PlanResult<AttributeValue> {
        let raw = raw.trim();
        let bad = || {
            PlanError::invalid(format!("'{}' is not a valid value for {}", raw, self.name()))
        };
        match self {
            DroneAttribute::Cooling | DroneAttribute::Heating => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(AttributeValue::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(AttributeValue::Bool(false))
                } else {
                    Err(bad())
                }
            }
            DroneAttribute::MaxMoves => raw.parse().map(AttributeValue::Int).map_err(|_| bad()),
            _ => raw.parse().map(AttributeValue::Float).map_err(|_| bad()),
        }
    }
}

impl FromStr for DroneAttribute {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or_else(|| PlanError::invalid(format!("Unknown drone attribute '{}'", s)))
    }
}

impl fmt::Display for DroneAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
}

impl FromStr for Operator {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            other => Err(PlanError::invalid(format!("Unknown operator '{}'", other))),
        }
    }
}

impl Operator {
    /// Booleans only support `=` and `!=`; ordering operators never match them.
    pub fn holds(&self, actual: AttributeValue, expected: AttributeValue) -> bool {
        let ordering = match (actual, expected) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => {
                return match self {
                    Operator::Eq => a == b,
                    Operator::Ne => a != b,
                    Operator::Lt | Operator::Gt => false,
                };
            }
            (AttributeValue::Int(a), AttributeValue::Int(b)) => Some(a.cmp(&b)),
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a.partial_cmp(&b),
            _ => return false,
        };

        match (self, ordering) {
            (Operator::Eq, Some(Ordering::Equal)) => true,
            (Operator::Ne, Some(Ordering::Equal)) => false,
            (Operator::Ne, _) => true,
            (Operator::Lt, Some(Ordering::Less)) => true,
            (Operator::Gt, Some(Ordering::Greater)) => true,
            _ => false,
        }
    }
}

/// One `attribute operator value` condition as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy)]
struct CompiledCondition {
    attribute: DroneAttribute,
    operator: Operator,
    expected: AttributeValue,
}

impl CompiledCondition {
    fn compile(condition: &QueryCondition) -> PlanResult<Self> {
        let attribute: DroneAttribute = condition.attribute.parse()?;
        Ok(Self {
            attribute,
            operator: condition.operator.parse()?,
            expected: attribute.parse_value(&condition.value)?,
        })
    }

    fn matches(&self, drone: &Drone) -> bool {
        self.operator
            .holds(self.attribute.value_of(&drone.capability), self.expected)
    }
}

/// Ids of drones whose cooling flag equals `state`.
pub fn drones_with_cooling(drones: &[Drone], state: bool) -> Vec<String> {
    drones
        .iter()
        .filter(|drone| drone.capability.cooling == state)
        .map(|drone| drone.id.clone())
        .collect()
}

pub fn drone_details<'a>(drones: &'a [Drone], id: &str) -> PlanResult<&'a Drone> {
    drones
        .iter()
        .find(|drone| drone.id == id)
        .ok_or_else(|| PlanError::DroneNotFound(id.to_string()))
}

/// Ids of drones whose `attribute` equals `value`.
pub fn query_as_path(drones: &[Drone], attribute: &str, value: &str) -> PlanResult<Vec<String>> {
    query(
        drones,
        &[QueryCondition {
            attribute: attribute.to_string(),
            operator: "=".to_string(),
            value: value.to_string(),
        }],
    )
}

/// Ids of drones satisfying every condition.
pub fn query(drones: &[Drone], conditions: &[QueryCondition]) -> PlanResult<Vec<String>> {
    let compiled = conditions
        .iter()
        .map(CompiledCondition::compile)
        .collect::<PlanResult<Vec<_>>>()?;

    Ok(drones
        .iter()
        .filter(|drone| compiled.iter().all(|condition| condition.matches(drone)))
        .map(|drone| drone.id.clone())
        .collect())
}
