use crate::types::{CorrError, CorrResult};

/// Fresnel reflectance coefficients sampled over incidence angle.
///
/// The table is a sorted sequence of (angle, coefficient) pairs; lookups
/// interpolate linearly between the two bracketing angles and clamp to
/// the nearest endpoint outside the tabulated range.
#[derive(Debug, Clone)]
pub struct FresnelTable {
    entries: Vec<(f64, f64)>,
}

impl FresnelTable {
    /// Parse a table from text: one `angle coefficient` pair per line,
    /// whitespace separated, angles strictly ascending. Blank lines and
    /// `#` comment lines are skipped.
    pub fn parse(text: &str) -> CorrResult<Self> {
        let mut entries = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(CorrError::ResourceFormat(format!(
                    "Fresnel table line {}: expected 2 columns, found {}",
                    line_no + 1,
                    fields.len()
                )));
            }
            let angle: f64 = fields[0].parse().map_err(|_| {
                CorrError::ResourceFormat(format!(
                    "Fresnel table line {}: non-numeric angle '{}'",
                    line_no + 1,
                    fields[0]
                ))
            })?;
            let coefficient: f64 = fields[1].parse().map_err(|_| {
                CorrError::ResourceFormat(format!(
                    "Fresnel table line {}: non-numeric coefficient '{}'",
                    line_no + 1,
                    fields[1]
                ))
            })?;
            if let Some(&(prev_angle, _)) = entries.last() {
                if angle <= prev_angle {
                    return Err(CorrError::ResourceFormat(format!(
                        "Fresnel table line {}: angle {} not above previous angle {}",
                        line_no + 1,
                        angle,
                        prev_angle
                    )));
                }
            }
            entries.push((angle, coefficient));
        }
        if entries.len() < 2 {
            return Err(CorrError::ResourceFormat(format!(
                "Fresnel table needs at least 2 entries, found {}",
                entries.len()
            )));
        }
        log::debug!("Loaded Fresnel table with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Coefficient at `angle_degrees`, linearly interpolated between the
    /// bracketing entries; exact matches return the tabulated value.
    pub fn coefficient_for(&self, angle_degrees: f64) -> f64 {
        let first = self.entries[0];
        let last = self.entries[self.entries.len() - 1];
        if angle_degrees <= first.0 {
            return first.1;
        }
        if angle_degrees >= last.0 {
            return last.1;
        }
        // entries are sorted, find the upper bracket
        let upper = self
            .entries
            .iter()
            .position(|&(a, _)| a >= angle_degrees)
            .unwrap_or(self.entries.len() - 1);
        let (a1, c1) = self.entries[upper];
        if a1 == angle_degrees {
            return c1;
        }
        let (a0, c0) = self.entries[upper - 1];
        let weight = (angle_degrees - a0) / (a1 - a0);
        c0 + weight * (c1 - c0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TABLE: &str = "0.0 0.020\n30.0 0.022\n60.0 0.060\n90.0 1.000\n";

    #[test]
    fn test_exact_match_returns_tabulated_value() {
        let table = FresnelTable::parse(TABLE).unwrap();
        assert_abs_diff_eq!(table.coefficient_for(30.0), 0.022, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolation_lies_between_brackets() {
        let table = FresnelTable::parse(TABLE).unwrap();
        let c = table.coefficient_for(45.0);
        assert!(c > 0.022 && c < 0.060);
        assert_abs_diff_eq!(c, 0.041, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range_clamps_to_endpoints() {
        let table = FresnelTable::parse(TABLE).unwrap();
        assert_abs_diff_eq!(table.coefficient_for(-5.0), 0.020, epsilon = 1e-12);
        assert_abs_diff_eq!(table.coefficient_for(95.0), 1.000, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        assert!(FresnelTable::parse("0.0 0.02 1.0\n10.0 0.03\n").is_err());
    }

    #[test]
    fn test_rejects_non_numeric_field() {
        assert!(FresnelTable::parse("0.0 abc\n10.0 0.03\n").is_err());
    }

    #[test]
    fn test_rejects_unsorted_angles() {
        assert!(FresnelTable::parse("10.0 0.03\n0.0 0.02\n").is_err());
    }
}
