use serde_json::{Map, Value};

// ---------- Schema ----------

/// Column order the scaler and model were fit on.
pub const FEATURE_NAMES: [&str; 47] = [
    "pop", "emp", "emp_to_pop_ratio", "hc", "ccon", "cda", "cn", "ck",
    "rconna", "rdana", "rnna", "rkna", "rtfpna", "rwtfpna", "labsh", "irr",
    "delta", "xr", "pl_con", "pl_da", "pl_gdpo", "csh_c", "csh_i", "csh_g",
    "csh_x", "csh_m", "csh_r", "pl_c", "pl_i", "pl_g", "pl_x", "pl_m", "pl_n",
    "total", "excl_energy", "energy", "metals_minerals", "forestry",
    "agriculture", "fish", "total_change", "excl_energy_change",
    "energy_change", "metals_minerals_change", "forestry_change",
    "agriculture_change", "fish_change",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

// ---------- Errors ----------

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: &'static str,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid feature values: {}", summarize(.0))]
pub struct CodecError(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.msg))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------- Coercion ----------

const NOT_NUMERIC: &str = "Must be numeric";
const NOT_A_FLOAT: &str = "value is not a valid float";

/// The one rule every schema field goes through.
fn coerce(value: Option<&Value>) -> Result<f64, &'static str> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or(NOT_A_FLOAT),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            // "nan" / "inf" parse, but are refused here rather than at inference
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(NOT_NUMERIC),
        },
        Some(Value::Array(_)) | Some(Value::Object(_)) => Err(NOT_A_FLOAT),
    }
}

/// Map an incoming flat record onto the schema order.
/// Unknown keys are ignored, missing keys become 0.0, and every failing
/// field is reported at once.
pub fn order_from_record(record: &Map<String, Value>) -> Result<Vec<f64>, CodecError> {
    let mut v = Vec::with_capacity(FEATURE_COUNT);
    let mut errors = Vec::new();
    for name in FEATURE_NAMES {
        match coerce(record.get(name)) {
            Ok(x) => v.push(x),
            Err(msg) => errors.push(FieldError { field: name, msg }),
        }
    }
    if errors.is_empty() {
        Ok(v)
    } else {
        Err(CodecError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn schema_has_no_duplicates() {
        let set: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(set.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_NAMES[0], "pop");
        assert_eq!(FEATURE_NAMES[FEATURE_COUNT - 1], "fish_change");
    }

    #[test]
    fn empty_record_is_all_zero() {
        let v = order_from_record(&Map::new()).unwrap();
        assert_eq!(v, vec![0.0; FEATURE_COUNT]);
    }

    #[test]
    fn values_land_in_schema_order() {
        let v = order_from_record(&record(json!({
            "fish_change": 3.0,
            "pop": 1.0,
            "hc": "2.5",
            "not_a_feature": "whatever",
        })))
        .unwrap();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[3], 2.5);
        assert_eq!(v[FEATURE_COUNT - 1], 3.0);
        assert_eq!(v.iter().filter(|x| **x != 0.0).count(), 3);
    }

    #[test]
    fn null_and_bool_coerce() {
        let v = order_from_record(&record(json!({"pop": null, "emp": true, "hc": false}))).unwrap();
        assert_eq!(&v[..4], &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn numeric_string_with_whitespace_is_accepted() {
        let v = order_from_record(&record(json!({"xr": " 1.5 "}))).unwrap();
        assert_eq!(v[17], 1.5);
    }

    #[test]
    fn bad_strings_are_all_reported() {
        let err = order_from_record(&record(json!({
            "energy": "abc",
            "pop": "12x",
            "emp": [1.0],
        })))
        .unwrap_err();
        assert_eq!(
            err.0,
            vec![
                FieldError { field: "pop", msg: NOT_NUMERIC },
                FieldError { field: "emp", msg: NOT_A_FLOAT },
                FieldError { field: "energy", msg: NOT_NUMERIC },
            ]
        );
        assert!(err.to_string().contains("energy: Must be numeric"));
    }

    #[test]
    fn non_finite_strings_are_refused_before_inference() {
        for s in ["nan", "NaN", "inf", "-infinity"] {
            let err = order_from_record(&record(json!({ "pop": s }))).unwrap_err();
            assert_eq!(err.0, vec![FieldError { field: "pop", msg: NOT_NUMERIC }], "{}", s);
        }
    }
}
