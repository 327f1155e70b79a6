//! Finds the largest feasible growth rate by bracketing and bisection
//!
//! Feasibility is assumed to be monotone in μ: once a growth rate is infeasible, every larger one
//! is too. The search first checks μ = 0, then doubles a trial growth rate until it becomes
//! infeasible, and finally halves the bracket `[feasible, infeasible)` until it is narrower than
//! the tolerance. Each check builds a fresh linear program and asks the oracle whether it is
//! feasible. Only the final program, at the converged growth rate, is solved for its optimum.
use derive_builder::Builder;
use log::{debug, info, warn};

use crate::model::medium::Medium;
use crate::model::model::{ModelError, RbaModel};
use crate::optimize::problem::LinearProgram;
use crate::optimize::solvers::{LpOracle, OracleError};
use crate::optimize::{LpSolution, OptimizationStatus};
use crate::rba::{matrix, RbaError};

/// Controls the growth rate search
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(default)]
pub struct SearchSettings {
    /// Stop once the bracket is narrower than this
    pub absolute_tolerance: f64,
    /// Stop once the bracket is narrower than this fraction of its upper end
    pub relative_tolerance: f64,
    /// Largest number of bisection steps
    pub max_iterations: usize,
    /// First growth rate tried after μ = 0
    pub initial_growth_rate: f64,
    /// How many times the trial growth rate is doubled before growth is declared unbounded
    pub max_doublings: usize,
    /// Number of evenly spaced growth rates below the optimum checked for feasibility, 0 to skip
    pub monotonicity_samples: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            absolute_tolerance: 1e-6,
            relative_tolerance: 0.,
            max_iterations: 100,
            initial_growth_rate: 0.5,
            max_doublings: 30,
            monotonicity_samples: 0,
        }
    }
}

impl SearchSettings {
    fn check(&self) -> Result<(), RbaError> {
        if !(self.absolute_tolerance >= 0.) || !(self.relative_tolerance >= 0.) {
            return Err(RbaError::InvalidSettings(
                "tolerances must be non-negative".to_string(),
            ));
        }
        if !self.initial_growth_rate.is_finite() || self.initial_growth_rate <= 0. {
            return Err(RbaError::InvalidSettings(format!(
                "initial growth rate {} must be positive",
                self.initial_growth_rate
            )));
        }
        Ok(())
    }

    fn converged(&self, lower: f64, upper: f64) -> bool {
        upper - lower <= self.absolute_tolerance.max(self.relative_tolerance * upper)
    }
}

/// What the search found
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Largest growth rate found feasible
    pub growth_rate: f64,
    /// Smallest growth rate found infeasible
    pub infeasible_growth_rate: f64,
    /// Program built at `growth_rate`
    pub program: LinearProgram,
    /// Optimal solution of `program`
    pub solution: LpSolution,
    /// Number of bisection steps taken
    pub iterations: usize,
}

fn oracle_error(growth_rate: f64) -> impl FnOnce(OracleError) -> RbaError {
    move |err| match err {
        OracleError::Timeout => RbaError::OracleTimeout { growth_rate },
        source => RbaError::Oracle {
            growth_rate,
            source,
        },
    }
}

/// Build the program at `growth_rate` and solve it
fn solve_at(
    model: &RbaModel,
    medium: &Medium,
    oracle: &mut dyn LpOracle,
    growth_rate: f64,
) -> Result<(LinearProgram, LpSolution), RbaError> {
    let program = matrix::build(model, medium, growth_rate)?;
    let solution = oracle
        .solve(&program)
        .map_err(oracle_error(growth_rate))?;
    debug!("Growth rate {}: {}", growth_rate, solution.status);
    Ok((program, solution))
}

/// Check whether the model can grow at `growth_rate` in `medium`
///
/// Only the constraints matter here, an unbounded growth objective still counts as feasible.
pub fn is_feasible(
    model: &RbaModel,
    medium: &Medium,
    oracle: &mut dyn LpOracle,
    growth_rate: f64,
) -> Result<bool, RbaError> {
    let program = matrix::build(model, medium, growth_rate)?;
    let feasible = oracle
        .check_feasibility(&program)
        .map_err(oracle_error(growth_rate))?;
    debug!(
        "Growth rate {}: {}",
        growth_rate,
        if feasible { "feasible" } else { "infeasible" }
    );
    Ok(feasible)
}

/// Find the largest feasible growth rate of a model in a medium
///
/// The model is validated first. Errors:
/// - [`RbaError::ModelInfeasible`] when even μ = 0 is infeasible
/// - [`RbaError::UnboundedGrowth`] when no infeasible growth rate is found within
///   `max_doublings` doublings
/// - [`RbaError::UnboundedObjective`] or [`RbaError::FinalSolveFailed`] when the final solve at
///   the converged growth rate doesn't give an optimum
/// - [`ModelError::NonMonotonicFeasibility`] when sampling finds an infeasible growth rate below
///   the converged one
pub fn search(
    model: &RbaModel,
    medium: &Medium,
    oracle: &mut dyn LpOracle,
    settings: &SearchSettings,
) -> Result<SearchOutcome, RbaError> {
    model.validate()?;
    settings.check()?;

    if !is_feasible(model, medium, oracle, 0.)? {
        return Err(RbaError::ModelInfeasible);
    }

    // region Bracketing
    let mut lower = 0.;
    let mut upper = settings.initial_growth_rate;
    let mut doublings = 0;
    while is_feasible(model, medium, oracle, upper)? {
        lower = upper;
        if doublings == settings.max_doublings {
            warn!("Still feasible at growth rate {} after {} doublings", lower, doublings);
            return Err(RbaError::UnboundedGrowth {
                last_feasible: lower,
            });
        }
        doublings += 1;
        upper *= 2.;
    }
    info!("Optimal growth rate bracketed in [{}, {})", lower, upper);
    // endregion Bracketing

    // region Bisection
    let mut iterations = 0;
    while !settings.converged(lower, upper) && iterations < settings.max_iterations {
        let mid = lower + (upper - lower) / 2.;
        if mid <= lower || mid >= upper {
            // Bracket is at the resolution of f64
            break;
        }
        iterations += 1;
        if is_feasible(model, medium, oracle, mid)? {
            lower = mid;
        } else {
            upper = mid;
        }
    }
    if !settings.converged(lower, upper) {
        warn!(
            "Stopped bisecting after {} iterations with bracket [{}, {})",
            iterations, lower, upper
        );
    }
    // endregion Bisection

    if settings.monotonicity_samples > 0 && lower > 0. {
        check_monotonicity(model, medium, oracle, lower, settings.monotonicity_samples)?;
    }

    let (program, solution) = solve_at(model, medium, oracle, lower)?;
    match solution.status {
        OptimizationStatus::Optimal => {}
        OptimizationStatus::Unbounded => {
            return Err(RbaError::UnboundedObjective { growth_rate: lower })
        }
        status => {
            return Err(RbaError::FinalSolveFailed {
                growth_rate: lower,
                status,
            })
        }
    }
    info!(
        "Optimal growth rate {} found after {} bisection steps",
        lower, iterations
    );
    Ok(SearchOutcome {
        growth_rate: lower,
        infeasible_growth_rate: upper,
        program,
        solution,
        iterations,
    })
}

/// Check evenly spaced growth rates in `(0, feasible)`, all of which should be feasible
fn check_monotonicity(
    model: &RbaModel,
    medium: &Medium,
    oracle: &mut dyn LpOracle,
    feasible: f64,
    samples: usize,
) -> Result<(), RbaError> {
    for i in 1..=samples {
        let growth_rate = feasible * i as f64 / (samples + 1) as f64;
        if !is_feasible(model, medium, oracle, growth_rate)? {
            warn!(
                "Growth rate {} is infeasible below feasible growth rate {}",
                growth_rate, feasible
            );
            return Err(ModelError::NonMonotonicFeasibility {
                feasible,
                infeasible: growth_rate,
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enzyme::EnzymeBuilder;
    use crate::model::function::GrowthFunction;
    use crate::model::model::{DensityBuilder, FluxTargetBuilder};
    use crate::model::reaction::ReactionBuilder;
    use crate::model::species::Species;
    use indexmap::IndexMap;

    /// One reaction `v`, with `v >= μ`, `v <= efficiency·E` and `E <= limit`
    fn single_enzyme_model(efficiency: GrowthFunction, limit: Option<f64>) -> RbaModel {
        let mut model = RbaModel::new_empty();
        model.add_species(Species::internal("X"));
        model.add_reaction(
            ReactionBuilder::default()
                .id("R")
                .lower_bound(0.)
                .upper_bound(1000.)
                .build()
                .unwrap(),
        );
        model.add_enzyme(
            EnzymeBuilder::default()
                .id("E")
                .reaction("R")
                .forward_efficiency(efficiency)
                .build()
                .unwrap(),
        );
        if let Some(limit) = limit {
            let mut enzyme_weights = IndexMap::new();
            enzyme_weights.insert("E".to_string(), 1.);
            model.add_density(
                DensityBuilder::default()
                    .id("protein")
                    .limit(GrowthFunction::constant(limit))
                    .enzyme_weights(enzyme_weights)
                    .build()
                    .unwrap(),
            );
        }
        model.add_target(
            FluxTargetBuilder::default()
                .id("growth")
                .reaction("R")
                .value(GrowthFunction::linear(0., 1.))
                .build()
                .unwrap(),
        );
        model.growth_reaction = Some("R".to_string());
        model.add_medium(Medium::empty("default"));
        model
    }

    /// Answers feasibility from a closure of μ, without looking at the program
    struct ThresholdOracle<F: Fn(f64) -> bool> {
        feasible: F,
        visited: Vec<f64>,
    }

    impl<F: Fn(f64) -> bool> LpOracle for ThresholdOracle<F> {
        fn name(&self) -> &'static str {
            "threshold"
        }

        fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
            self.visited.push(program.growth_rate());
            if (self.feasible)(program.growth_rate()) {
                Ok(LpSolution::optimal(
                    program.growth_rate(),
                    nalgebra::DVector::zeros(program.num_columns()),
                ))
            } else {
                Ok(LpSolution::without_primal(OptimizationStatus::Infeasible))
            }
        }
    }

    struct FailingOracle(OracleError);

    impl LpOracle for FailingOracle {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn solve(&mut self, _program: &LinearProgram) -> Result<LpSolution, OracleError> {
            Err(self.0.clone())
        }
    }

    #[test]
    fn bisection_converges_to_threshold() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = ThresholdOracle {
            feasible: |mu| mu <= 1.2345,
            visited: Vec::new(),
        };
        let settings = SearchSettings::default();
        let outcome = search(&model, medium, &mut oracle, &settings).unwrap();
        assert!(outcome.growth_rate <= 1.2345);
        assert!(1.2345 - outcome.growth_rate <= 1e-6);
        assert!(outcome.infeasible_growth_rate - outcome.growth_rate <= 1e-6);
        // 0, then 0.5, 1, 2 while bracketing
        assert_eq!(&oracle.visited[..4], &[0., 0.5, 1., 2.]);
        assert!((oracle.visited.last().unwrap() - outcome.growth_rate).abs() < 1e-25);
    }

    #[test]
    fn iteration_limit_stops_bisection() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = ThresholdOracle {
            feasible: |mu| mu <= 0.7,
            visited: Vec::new(),
        };
        let settings = SearchSettingsBuilder::default()
            .max_iterations(3)
            .build()
            .unwrap();
        let outcome = search(&model, medium, &mut oracle, &settings).unwrap();
        assert_eq!(outcome.iterations, 3);
        assert!(outcome.growth_rate <= 0.7);
        assert!(outcome.infeasible_growth_rate > 0.7);
    }

    #[test]
    fn infeasible_at_zero() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = ThresholdOracle {
            feasible: |_| false,
            visited: Vec::new(),
        };
        assert_eq!(
            search(&model, medium, &mut oracle, &SearchSettings::default()),
            Err(RbaError::ModelInfeasible)
        );
        assert_eq!(oracle.visited, vec![0.]);
    }

    #[test]
    fn unbounded_growth() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = ThresholdOracle {
            feasible: |_| true,
            visited: Vec::new(),
        };
        let settings = SearchSettingsBuilder::default()
            .max_doublings(4)
            .build()
            .unwrap();
        assert_eq!(
            search(&model, medium, &mut oracle, &settings),
            Err(RbaError::UnboundedGrowth { last_feasible: 8. })
        );
    }

    #[test]
    fn oracle_failures_carry_growth_rate() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let settings = SearchSettings::default();
        assert_eq!(
            search(&model, medium, &mut FailingOracle(OracleError::Timeout), &settings),
            Err(RbaError::OracleTimeout { growth_rate: 0. })
        );
        assert_eq!(
            search(
                &model,
                medium,
                &mut FailingOracle(OracleError::Numerical("stalled".to_string())),
                &settings
            ),
            Err(RbaError::Oracle {
                growth_rate: 0.,
                source: OracleError::Numerical("stalled".to_string())
            })
        );
    }

    /// Feasible up to μ = 1, counting how it is asked
    #[derive(Default)]
    struct CountingOracle {
        feasibility_checks: usize,
        solves: usize,
    }

    impl LpOracle for CountingOracle {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
            self.solves += 1;
            Ok(LpSolution::optimal(
                program.growth_rate(),
                nalgebra::DVector::zeros(program.num_columns()),
            ))
        }

        fn check_feasibility(&mut self, program: &LinearProgram) -> Result<bool, OracleError> {
            self.feasibility_checks += 1;
            Ok(program.growth_rate() <= 1.)
        }
    }

    #[test]
    fn only_the_final_program_is_optimized() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = CountingOracle::default();
        let outcome = search(&model, medium, &mut oracle, &SearchSettings::default()).unwrap();
        assert!((outcome.growth_rate - 1.).abs() <= 1e-6);
        assert_eq!(oracle.solves, 1);
        // μ = 0, three bracketing steps, then bisection
        assert_eq!(oracle.feasibility_checks, 4 + outcome.iterations);
    }

    #[test]
    fn invalid_model_is_rejected_before_solving() {
        let mut model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        model.growth_reaction = Some("GHOST".to_string());
        let medium = Medium::empty("default");
        let mut oracle = ThresholdOracle {
            feasible: |_| true,
            visited: Vec::new(),
        };
        assert!(matches!(
            search(&model, &medium, &mut oracle, &SearchSettings::default()),
            Err(RbaError::Model(ModelError::UnknownReaction { .. }))
        ));
        assert!(oracle.visited.is_empty());
    }

    #[test]
    fn invalid_settings() {
        let model = single_enzyme_model(GrowthFunction::constant(1.), Some(1.));
        let medium = model.medium("default").unwrap();
        let mut oracle = ThresholdOracle {
            feasible: |_| true,
            visited: Vec::new(),
        };
        let settings = SearchSettingsBuilder::default()
            .initial_growth_rate(0.)
            .build()
            .unwrap();
        assert!(matches!(
            search(&model, medium, &mut oracle, &settings),
            Err(RbaError::InvalidSettings(_))
        ));
    }

    #[cfg(feature = "minilp")]
    mod with_solver {
        use super::*;
        use crate::optimize::solvers::minilp::MinilpOracle;

        #[test]
        fn enzyme_and_density_limit_growth() {
            // v >= μ, v <= 4E, E <= 0.5 gives μ* = 2
            let model = single_enzyme_model(GrowthFunction::constant(4.), Some(0.5));
            let medium = model.medium("default").unwrap();
            let mut oracle = MinilpOracle::new();
            let outcome = search(&model, medium, &mut oracle, &SearchSettings::default()).unwrap();
            assert!((outcome.growth_rate - 2.).abs() <= 1e-6);
            assert!(outcome.growth_rate <= 2. + 1e-9);
            assert_eq!(outcome.solution.status, OptimizationStatus::Optimal);
            assert!(is_feasible(&model, medium, &mut oracle, 1.9).unwrap());
            assert!(!is_feasible(&model, medium, &mut oracle, 2.1).unwrap());
        }

        #[test]
        fn missing_density_means_unbounded_growth() {
            let model = single_enzyme_model(GrowthFunction::constant(4.), None);
            let medium = model.medium("default").unwrap();
            let mut oracle = MinilpOracle::new();
            let settings = SearchSettingsBuilder::default()
                .max_doublings(10)
                .build()
                .unwrap();
            assert!(matches!(
                search(&model, medium, &mut oracle, &settings),
                Err(RbaError::UnboundedGrowth { .. })
            ));
        }

        #[test]
        fn non_monotone_feasibility_is_reported() {
            // Efficiency is only nonzero for 1 <= μ <= 10, so small growth rates are infeasible
            let model = single_enzyme_model(GrowthFunction::indicator(1., 10.), Some(2.));
            let medium = model.medium("default").unwrap();
            let mut oracle = MinilpOracle::new();

            let unchecked = SearchSettingsBuilder::default()
                .initial_growth_rate(1.5)
                .build()
                .unwrap();
            // μ = 0 needs no flux and so stays feasible
            let outcome = search(&model, medium, &mut oracle, &unchecked).unwrap();
            assert!((outcome.growth_rate - 2.).abs() <= 1e-6);

            let checked = SearchSettingsBuilder::default()
                .initial_growth_rate(1.5)
                .monotonicity_samples(4)
                .build()
                .unwrap();
            match search(&model, medium, &mut oracle, &checked) {
                Err(RbaError::Model(ModelError::NonMonotonicFeasibility {
                    feasible,
                    infeasible,
                })) => {
                    assert!(infeasible < 1.);
                    assert!(feasible > infeasible);
                }
                other => panic!("expected non monotonic feasibility, got {:?}", other),
            }
        }
    }
}
