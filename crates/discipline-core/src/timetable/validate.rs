//! Per-entry validation of raw timetable JSON.
//!
//! Each element is checked on its own; a bad element never poisons its
//! neighbours.

use std::collections::HashSet;

use serde_json::Value;

use super::{Phase, ScheduledBlock};
use crate::error::ValidationError;
use crate::time_of_day::TimeOfDay;

/// Validate one raw element. Uniqueness is checked by [`validate_all`].
pub fn validate_entry(raw: &Value) -> Result<ScheduledBlock, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::Malformed("entry is not an object".into()))?;

    let name = match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err(ValidationError::EmptyName),
        Some(_) => return Err(ValidationError::Malformed("name is not a string".into())),
        None => return Err(ValidationError::EmptyName),
    };

    let start = time_field(obj.get("start"), "start")?;
    let end = time_field(obj.get("end"), "end")?;
    if start >= end {
        return Err(ValidationError::InvalidRange {
            name,
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let phase = match obj.get("phase") {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Phase::Number)
            .ok_or_else(|| ValidationError::Malformed(format!("phase {n} is not an identifier")))?,
        Some(Value::String(s)) if !s.trim().is_empty() => Phase::Name(s.trim().to_string()),
        other => {
            return Err(ValidationError::Malformed(format!(
                "phase missing or invalid: {}",
                other.map(Value::to_string).unwrap_or_else(|| "absent".into())
            )))
        }
    };

    let severity = match obj.get("severity") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
    .filter(|s| *s > 0)
    .ok_or_else(|| ValidationError::InvalidSeverity {
        name: name.clone(),
        value: obj
            .get("severity")
            .map(Value::to_string)
            .unwrap_or_else(|| "absent".into()),
    })?;

    Ok(ScheduledBlock {
        name,
        start,
        end,
        phase,
        severity,
    })
}

fn time_field(value: Option<&Value>, field: &str) -> Result<TimeOfDay, ValidationError> {
    let invalid = |value: String| ValidationError::InvalidTime {
        field: field.to_string(),
        value,
    };
    match value {
        Some(Value::String(s)) => s.parse().map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
        None => Err(invalid("absent".into())),
    }
}

/// Validate every element, keeping valid ones in order.
///
/// The first block with a given name wins; later duplicates are rejected.
/// Rejections are returned alongside their element index.
pub fn validate_all(raw: &[Value]) -> (Vec<ScheduledBlock>, Vec<(usize, ValidationError)>) {
    let mut blocks = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in raw.iter().enumerate() {
        match validate_entry(entry) {
            Ok(block) if !seen.insert(block.name.clone()) => {
                rejected.push((index, ValidationError::DuplicateName(block.name)));
            }
            Ok(block) => blocks.push(block),
            Err(e) => rejected.push((index, e)),
        }
    }

    (blocks, rejected)
}
