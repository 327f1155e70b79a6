//! Growth rate dependent coefficients.
//!
//! Enzyme efficiencies, process capacities, densities and targets are small pure functions of a
//! single variable, usually the growth rate. They are plain data here; the matrix builder is the
//! only place that evaluates them (see [`crate::rba::matrix::evaluate`]).
use serde::{Deserialize, Serialize};

/// The quantity a [`GrowthFunction`] is evaluated at
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionVariable {
    /// The candidate growth rate μ
    #[default]
    GrowthRate,
    /// The availability of a boundary species in the active medium
    Medium(String),
}

/// A coefficient expressed as a function of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GrowthFunction {
    /// Always `value`
    Constant { value: f64 },
    /// `intercept + slope*x`, with x clamped to `[x_min, x_max]` and the result clamped to
    /// `[y_min, y_max]`
    Linear {
        intercept: f64,
        slope: f64,
        #[serde(default)]
        x_min: Option<f64>,
        #[serde(default)]
        x_max: Option<f64>,
        #[serde(default)]
        y_min: Option<f64>,
        #[serde(default)]
        y_max: Option<f64>,
        #[serde(default)]
        variable: FunctionVariable,
    },
    /// `kmax*x/(km + x)`, floored at `y_min`
    MichaelisMenten {
        kmax: f64,
        km: f64,
        #[serde(default)]
        y_min: Option<f64>,
        #[serde(default)]
        variable: FunctionVariable,
    },
    /// `exp(rate*x)`
    Exponential {
        rate: f64,
        #[serde(default)]
        variable: FunctionVariable,
    },
    /// 1 when `x_min <= x <= x_max`, 0 otherwise
    Indicator {
        x_min: f64,
        x_max: f64,
        #[serde(default)]
        variable: FunctionVariable,
    },
}

impl GrowthFunction {
    /// Create a constant function
    pub fn constant(value: f64) -> Self {
        GrowthFunction::Constant { value }
    }

    /// Create an unclamped linear function of the growth rate
    pub fn linear(intercept: f64, slope: f64) -> Self {
        GrowthFunction::Linear {
            intercept,
            slope,
            x_min: None,
            x_max: None,
            y_min: None,
            y_max: None,
            variable: FunctionVariable::GrowthRate,
        }
    }

    /// Create a Michaelis-Menten saturation curve over the availability of a medium species
    pub fn medium_saturation(species: &str, kmax: f64, km: f64) -> Self {
        GrowthFunction::MichaelisMenten {
            kmax,
            km,
            y_min: None,
            variable: FunctionVariable::Medium(species.to_string()),
        }
    }

    /// Create an indicator function of the growth rate
    pub fn indicator(x_min: f64, x_max: f64) -> Self {
        GrowthFunction::Indicator {
            x_min,
            x_max,
            variable: FunctionVariable::GrowthRate,
        }
    }

    /// The variable the function depends on
    pub fn variable(&self) -> &FunctionVariable {
        static GROWTH_RATE: FunctionVariable = FunctionVariable::GrowthRate;
        match self {
            GrowthFunction::Constant { .. } => &GROWTH_RATE,
            GrowthFunction::Linear { variable, .. }
            | GrowthFunction::MichaelisMenten { variable, .. }
            | GrowthFunction::Exponential { variable, .. }
            | GrowthFunction::Indicator { variable, .. } => variable,
        }
    }

    /// Check that every parameter is a usable number
    ///
    /// Infinite clamps and indicator limits are allowed, NaN never is.
    pub fn is_well_formed(&self) -> bool {
        match self {
            GrowthFunction::Constant { value } => value.is_finite(),
            GrowthFunction::Linear {
                intercept,
                slope,
                x_min,
                x_max,
                y_min,
                y_max,
                ..
            } => {
                intercept.is_finite()
                    && slope.is_finite()
                    && [x_min, x_max, y_min, y_max]
                        .iter()
                        .all(|limit| limit.map_or(true, |l| !l.is_nan()))
            }
            GrowthFunction::MichaelisMenten { kmax, km, y_min, .. } => {
                kmax.is_finite() && km.is_finite() && y_min.map_or(true, |y| !y.is_nan())
            }
            GrowthFunction::Exponential { rate, .. } => rate.is_finite(),
            GrowthFunction::Indicator { x_min, x_max, .. } => !x_min.is_nan() && !x_max.is_nan(),
        }
    }
}
