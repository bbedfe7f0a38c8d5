//! Field-level grammar of the log text format

use crate::types::{Quat, Vec3};

pub const FIELD_SEPARATOR: char = ';';
pub const TUPLE_SEPARATOR: char = ',';

pub const STARTING_TIMESTAMP_KEY: &str = "startingTimestamp";
pub const INITIAL_ROTATION_KEY: &str = "InitialRotationQuaternion";

/// Parse a scalar field. Host locale never matters: '.' is the only decimal separator.
pub fn parse_scalar(field: &str) -> Result<f64, String> {
    let trimmed = field.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| format!("'{}' is not a number", trimmed))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", trimmed));
    }
    Ok(value)
}

/// Parse a parenthesized tuple such as `(1.0,2.5,-3)` with exactly `N` components
pub fn parse_tuple<const N: usize>(field: &str) -> Result<[f64; N], String> {
    let inner = field.trim().trim_start_matches('(').trim_end_matches(')');
    let mut out = [0.0; N];
    let mut count = 0;

    for part in inner.split(TUPLE_SEPARATOR) {
        if count == N {
            return Err(format!("expected {} components in '{}'", N, field.trim()));
        }
        out[count] = parse_scalar(part)?;
        count += 1;
    }

    if count != N {
        return Err(format!("expected {} components in '{}'", N, field.trim()));
    }
    Ok(out)
}

pub fn parse_vec3(field: &str) -> Result<Vec3, String> {
    let [x, y, z] = parse_tuple::<3>(field)?;
    Ok(Vec3::new(x, y, z))
}

pub fn parse_quat(field: &str) -> Result<Quat, String> {
    let [x, y, z, w] = parse_tuple::<4>(field)?;
    Ok(Quat::new(x, y, z, w))
}
