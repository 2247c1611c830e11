use serde::Serialize;

/// Quartile thresholds separating the non-empty activity levels of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileBins {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Intensity bucket of one day on the activity grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatLevel {
    Empty,
    Low,
    Medium,
    High,
    Peak,
}

/// Nearest-rank quartiles over the non-zero values. A rank falling exactly
/// between two positions resolves to the even index, so a two-sample median
/// stays on the lower sample. When every value is zero the fixed
/// placeholders keep the scale usable; the grid renders empty either way.
pub fn quantile_bins(values: &[f64]) -> QuantileBins {
    let mut non_zero: Vec<f64> = values.iter().copied().filter(|v| *v > 0.).collect();
    if non_zero.is_empty() {
        return QuantileBins {
            q1: 0.25,
            q2: 0.5,
            q3: 0.75,
        };
    }
    non_zero.sort_by(|a, b| a.total_cmp(b));

    let rank = |p: f64| {
        let index = (p * (non_zero.len() - 1) as f64).round_ties_even() as usize;
        non_zero[index.min(non_zero.len() - 1)]
    };
    QuantileBins {
        q1: rank(0.25),
        q2: rank(0.5),
        q3: rank(0.75),
    }
}

pub fn heat_level(hours: f64, bins: &QuantileBins) -> HeatLevel {
    if hours <= 0. {
        HeatLevel::Empty
    } else if hours <= bins.q1 {
        HeatLevel::Low
    } else if hours <= bins.q2 {
        HeatLevel::Medium
    } else if hours <= bins.q3 {
        HeatLevel::High
    } else {
        HeatLevel::Peak
    }
}
