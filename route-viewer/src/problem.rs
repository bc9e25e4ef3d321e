//! Sub-selection of a problem file before it is sent to the solver.
//!
//! A problem is forwarded to the solver as opaque JSON. The only parts
//! inspected here are its top-level `vehicles` and `customers` arrays,
//! which can be narrowed to a chosen set of indices.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// Index list could not be parsed
    #[error("invalid {field} selection: {input:?}")]
    InvalidList { field: &'static str, input: String },

    /// Problem has no array under this key
    #[error("problem has no `{field}` array")]
    MissingArray { field: &'static str },

    /// Index past the end of the array
    #[error("{field} index {index} out of range (have {len})")]
    OutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    /// Selection would leave the array empty
    #[error("at least one {field} entry must be selected")]
    Empty { field: &'static str },
}

/// Indices to keep. `None` keeps the whole array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemSelection {
    pub vehicles: Option<BTreeSet<usize>>,
    pub customers: Option<BTreeSet<usize>>,
}

/// Sizes of a problem's arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProblemCounts {
    pub vehicles: usize,
    pub customers: usize,
}

impl ProblemCounts {
    pub fn of(problem: &Value) -> Self {
        let len = |key: &str| problem.get(key).and_then(Value::as_array).map_or(0, Vec::len);
        Self {
            vehicles: len("vehicles"),
            customers: len("customers"),
        }
    }
}

impl ProblemSelection {
    /// Build a selection from comma-separated index lists such as `"0,2,3"`.
    pub fn parse(vehicles: Option<&str>, customers: Option<&str>) -> Result<Self, SelectionError> {
        Ok(Self {
            vehicles: vehicles.map(|s| parse_indices("vehicles", s)).transpose()?,
            customers: customers.map(|s| parse_indices("customers", s)).transpose()?,
        })
    }

    pub fn is_everything(&self) -> bool {
        self.vehicles.is_none() && self.customers.is_none()
    }

    /// Copy of `problem` with its arrays narrowed to the selected indices.
    /// Every other key is kept as-is.
    pub fn apply(&self, problem: &Value) -> Result<Value, SelectionError> {
        let mut out = problem.clone();
        if let Some(keep) = &self.vehicles {
            filter_array(&mut out, "vehicles", keep)?;
        }
        if let Some(keep) = &self.customers {
            filter_array(&mut out, "customers", keep)?;
        }
        Ok(out)
    }
}

fn parse_indices(field: &'static str, input: &str) -> Result<BTreeSet<usize>, SelectionError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|_| SelectionError::InvalidList {
                field,
                input: input.to_string(),
            })
        })
        .collect()
}

fn filter_array(
    problem: &mut Value,
    field: &'static str,
    keep: &BTreeSet<usize>,
) -> Result<(), SelectionError> {
    let items = problem
        .get_mut(field)
        .and_then(Value::as_array_mut)
        .ok_or(SelectionError::MissingArray { field })?;

    if keep.is_empty() {
        return Err(SelectionError::Empty { field });
    }
    if let Some(&index) = keep.iter().next_back()
        && index >= items.len()
    {
        return Err(SelectionError::OutOfRange {
            field,
            index,
            len: items.len(),
        });
    }

    let mut position = 0;
    items.retain(|_| {
        let kept = keep.contains(&position);
        position += 1;
        kept
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn problem() -> Value {
        json!({
            "depot": {"location": [38.1, 13.36]},
            "vehicles": [{"id": 0}, {"id": 1}, {"id": 2}],
            "customers": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}]
        })
    }

    #[test]
    fn parse_index_lists() {
        let sel = ProblemSelection::parse(Some("2, 0,2"), None).unwrap();
        assert_eq!(sel.vehicles, Some(BTreeSet::from([0, 2])));
        assert_eq!(sel.customers, None);
        assert!(!sel.is_everything());
        assert!(ProblemSelection::parse(None, None).unwrap().is_everything());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            ProblemSelection::parse(None, Some("1,x")),
            Err(SelectionError::InvalidList {
                field: "customers",
                input: "1,x".to_string()
            })
        );
    }

    #[test]
    fn apply_keeps_order_and_other_keys() {
        let sel = ProblemSelection::parse(Some("2,0"), Some("1,3")).unwrap();
        let out = sel.apply(&problem()).unwrap();

        assert_eq!(out["vehicles"], json!([{"id": 0}, {"id": 2}]));
        assert_eq!(out["customers"], json!([{"id": "b"}, {"id": "d"}]));
        assert_eq!(out["depot"], problem()["depot"]);
        assert_eq!(ProblemCounts::of(&out), ProblemCounts { vehicles: 2, customers: 2 });
    }

    #[test]
    fn empty_selection_is_rejected() {
        let sel = ProblemSelection::parse(Some(""), None).unwrap();
        assert_eq!(
            sel.apply(&problem()),
            Err(SelectionError::Empty { field: "vehicles" })
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        let sel = ProblemSelection::parse(None, Some("4")).unwrap();
        assert!(matches!(
            sel.apply(&problem()),
            Err(SelectionError::OutOfRange { field: "customers", index: 4, len: 4 })
        ));
    }

    #[test]
    fn missing_array_only_matters_when_selected() {
        let bare = json!({"vehicles": [1, 2]});
        assert_eq!(ProblemSelection::default().apply(&bare).unwrap(), bare);
        assert_eq!(
            ProblemSelection::parse(None, Some("0")).unwrap().apply(&bare),
            Err(SelectionError::MissingArray { field: "customers" })
        );
        assert_eq!(ProblemCounts::of(&bare), ProblemCounts { vehicles: 2, customers: 0 });
    }
}
