//! One discrete step of the SEIQHRF model.
//!
//! Every draw made while computing step `t` reads the population as it was at the end of
//! step `t - 1`. Decisions are collected first and applied afterwards, so an individual
//! moved during a step is never evaluated twice in that step, and the order in which
//! compartments are visited does not change the outcome.
//!
//! Competing exits of the same individual are drawn independently and resolved by
//! severity: hospitalization before quarantine before recovery for I, hospitalization
//! before recovery for Q, and fatality before discharge for H. A background departure
//! supersedes any disease transition drawn for the same step.
use indexmap::IndexSet;
use log::{debug, trace};
use rand_distr::Poisson;
use rustc_hash::FxBuildHasher;
use strum::{EnumCount, IntoEnumIterator};

use crate::compartment::{Compartment, CompartmentCounts, FlowCounts, Transition};
use crate::config::{
    contact_params, departure_param, duration_params, rate_param, Control, ModelConfig,
};
use crate::draw_policy::{effective_fatality_rate, DrawPolicy, DurationDistribution};
use crate::parameters::{Param, ParameterResolver};
use crate::population::{ExitDurations, IndividualId, Population, NO_DURATIONS};
use crate::random::{sample_multiple_from_known_length, RngStream, RunRng};
use crate::run::StepRecord;

type IdSet = IndexSet<IndividualId, FxBuildHasher>;

/// The random stream that drives a transition.
fn stream_of(transition: Transition) -> RngStream {
    match transition {
        Transition::Infection => RngStream::Infection,
        Transition::Progression => RngStream::Progression,
        Transition::Quarantine => RngStream::Quarantine,
        Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
            RngStream::Hospitalization
        }
        Transition::InfectiousRecovery | Transition::QuarantinedRecovery => RngStream::Recovery,
        Transition::Fatality => RngStream::Fatality,
        Transition::Discharge => RngStream::Discharge,
    }
}

/// Applies the per-step algorithm to a population.
///
/// The engine holds no state of its own beyond the configuration; the population and the
/// random streams belong to the run.
pub struct TransitionEngine<'a> {
    resolver: &'a ParameterResolver,
    control: Control,
    vital: bool,
    policies: [DrawPolicy; Transition::COUNT],
}

impl<'a> TransitionEngine<'a> {
    #[must_use]
    pub fn new(config: &ModelConfig, resolver: &'a ParameterResolver) -> Self {
        let mut policies = [DrawPolicy::Binomial; Transition::COUNT];
        for transition in Transition::iter() {
            policies[transition.index()] =
                DrawPolicy::from_flag(config.control.is_random(transition));
        }
        Self {
            resolver,
            control: config.control,
            vital: config.vital,
            policies,
        }
    }

    #[must_use]
    pub fn policy(&self, transition: Transition) -> DrawPolicy {
        self.policies[transition.index()]
    }

    /// Populates an empty population with `counts` at step 0. No transitions are applied.
    pub fn initialize(
        &self,
        population: &mut Population,
        rng: &mut RunRng,
        counts: CompartmentCounts,
    ) {
        let occupancy = counts[Compartment::H];
        for compartment in Compartment::iter() {
            for _ in 0..counts[compartment] {
                let durations = self.entry_durations(compartment, 0, occupancy, rng);
                population.add(compartment, 0, durations);
            }
        }
        debug!("initialized population of {}", population.size());
    }

    /// The per-step probability of `transition` at `step`, given the hospital occupancy of
    /// the snapshot. Infection has no per-step rate of its own (see `infection`) and
    /// resolves to zero.
    #[must_use]
    pub fn rate(&self, transition: Transition, step: usize, occupancy: usize) -> f64 {
        match transition {
            Transition::Fatality => self.fatality_rate(step, occupancy),
            _ => rate_param(transition).map_or(0.0, |param| self.resolver.resolve(param, step)),
        }
    }

    /// The capacity-dependent fatality probability at `step`.
    #[must_use]
    pub fn fatality_rate(&self, step: usize, occupancy: usize) -> f64 {
        effective_fatality_rate(
            occupancy,
            self.resolver.resolve(Param::HospCap, step),
            self.resolver.resolve(Param::FatRateBase, step),
            self.resolver.resolve(Param::FatRateOvercap, step),
            self.resolver.resolve(Param::FatTcoeff, step),
        )
    }

    /// The distribution a duration-mode transition samples its residence time from at
    /// `step`. Without an explicit shape and scale the residence time is exponential with
    /// mean `1 / rate`.
    #[must_use]
    pub fn duration_distribution(
        &self,
        transition: Transition,
        step: usize,
        occupancy: usize,
    ) -> DurationDistribution {
        let explicit = duration_params(transition).and_then(|(shape, scale)| {
            Some((self.resolver.get(shape, step)?, self.resolver.get(scale, step)?))
        });
        match explicit {
            Some((shape, scale)) => DurationDistribution::gamma(shape, scale),
            None => DurationDistribution::from_rate(self.rate(transition, step, occupancy)),
        }
    }

    /// Samples the residence times of an individual entering `compartment` at `step`, one
    /// per duration-mode exit.
    fn entry_durations(
        &self,
        compartment: Compartment,
        step: usize,
        occupancy: usize,
        rng: &mut RunRng,
    ) -> ExitDurations {
        let mut durations = NO_DURATIONS;
        for (exit, transition) in Transition::exits(compartment).iter().enumerate() {
            if self.policy(*transition) == DrawPolicy::Duration {
                let distribution = self.duration_distribution(*transition, step, occupancy);
                durations[exit] = distribution.sample(rng.get_rng(stream_of(*transition)));
            }
        }
        durations
    }

    /// Computes step `step` from the population at `step - 1`, mutating it in place.
    ///
    /// # Errors
    ///
    /// Returns a description of the discrepancy if the population accounting does not
    /// balance after the step.
    pub fn step(
        &self,
        population: &mut Population,
        rng: &mut RunRng,
        step: usize,
    ) -> Result<StepRecord, String> {
        let size_before = population.size();
        let occupancy = population.count(Compartment::H);

        let exposed = self.infection(population, rng, step);
        let decisions = self.progression_and_exits(population, rng, step, occupancy);
        let departing = if self.vital {
            self.departures(population, rng, step)
        } else {
            IdSet::default()
        };

        let mut flows = FlowCounts::default();
        for id in exposed {
            if !departing.contains(&id) {
                self.move_individual(population, rng, id, Transition::Infection, step, occupancy);
                flows[Transition::Infection] += 1;
            }
        }
        for (id, transition) in decisions {
            if !departing.contains(&id) {
                self.move_individual(population, rng, id, transition, step, occupancy);
                flows[transition] += 1;
            }
        }

        let mut departures = CompartmentCounts::default();
        for id in departing {
            if let Some(compartment) = population.depart(id, step) {
                departures[compartment] += 1;
            }
        }

        let arrivals = if self.vital {
            self.arrivals(population, rng, step, size_before, occupancy)
        } else {
            CompartmentCounts::default()
        };

        let expected = size_before + arrivals.total() - departures.total();
        let counts = population.counts();
        if counts.total() != expected {
            return Err(format!(
                "S+E+I+Q+H+R+F = {} after step, expected {size_before} + {} arrivals - {} departures = {expected}",
                counts.total(),
                arrivals.total(),
                departures.total()
            ));
        }
        population.verify()?;

        trace!("step {step}: counts {:?}", counts.as_array());
        Ok(StepRecord {
            step,
            counts,
            flows,
            arrivals,
            departures,
        })
    }

    fn move_individual(
        &self,
        population: &mut Population,
        rng: &mut RunRng,
        id: IndividualId,
        transition: Transition,
        step: usize,
        occupancy: usize,
    ) {
        let durations = self.entry_durations(transition.target(), step, occupancy, rng);
        let moved = population.apply(id, transition, step, durations);
        debug_assert!(
            moved,
            "{transition:?} applied to {id:?} outside {:?}",
            transition.source()
        );
    }

    /// Draws the susceptibles exposed this step.
    ///
    /// Each member of an infectious compartment makes a Poisson number of contacts with
    /// uniformly chosen living individuals. A contact reaches a susceptible with
    /// probability `|S| / (N - 1)` and then infects with the compartment's per-contact
    /// probability. Targets are deduplicated, so exposures never exceed `|S|`.
    fn infection(&self, population: &Population, rng: &mut RunRng, step: usize) -> IdSet {
        let mut exposed = IdSet::default();
        let susceptible = population.count(Compartment::S);
        let others = population.living().saturating_sub(1);
        if susceptible == 0 || others == 0 {
            return exposed;
        }
        let reach_susceptible = (susceptible as f64 / others as f64).min(1.0);

        for compartment in Compartment::INFECTIOUS {
            let Some((act_param, inf_param)) = contact_params(compartment) else {
                continue;
            };
            let act_rate = self.resolver.resolve(act_param, step);
            let inf_prob = self.resolver.resolve(inf_param, step);
            if act_rate <= 0.0 || inf_prob <= 0.0 || population.count(compartment) == 0 {
                continue;
            }
            let Ok(contacts) = Poisson::new(act_rate) else {
                continue;
            };
            let p_transmit = reach_susceptible * inf_prob;
            for _ in population.members(compartment) {
                let n_contacts: f64 = rng.sample_distr(RngStream::Infection, &contacts);
                for _ in 0..n_contacts as u64 {
                    if rng.sample_bool(RngStream::Infection, p_transmit) {
                        let position = rng.sample_range(RngStream::Infection, 0..susceptible);
                        if let Some(target) = population.member_at(Compartment::S, position) {
                            exposed.insert(target);
                        }
                    }
                }
                if exposed.len() == susceptible {
                    return exposed;
                }
            }
        }
        exposed
    }

    /// Draws progression and the exits of I, Q and H against the snapshot.
    fn progression_and_exits(
        &self,
        population: &Population,
        rng: &mut RunRng,
        step: usize,
        occupancy: usize,
    ) -> Vec<(IndividualId, Transition)> {
        let mut decisions = Vec::new();
        for compartment in [Compartment::E, Compartment::I, Compartment::Q, Compartment::H] {
            let exits = Transition::exits(compartment);
            let rates: Vec<f64> = exits
                .iter()
                .map(|transition| self.rate(*transition, step, occupancy))
                .collect();
            for &id in population.members(compartment) {
                let Some(individual) = population.get(id) else {
                    continue;
                };
                let elapsed = step.saturating_sub(individual.entered_at());
                let mut chosen = None;
                // Every exit is drawn, even once one has fired, so that the draws consumed
                // do not depend on precedence.
                for (exit, transition) in exits.iter().enumerate() {
                    let fired = self.policy(*transition).fires(
                        rng,
                        stream_of(*transition),
                        rates[exit],
                        elapsed,
                        individual.duration(exit),
                    );
                    if fired && chosen.is_none() {
                        chosen = Some(*transition);
                    }
                }
                if let Some(transition) = chosen {
                    decisions.push((id, transition));
                }
            }
        }
        decisions
    }

    /// Draws the individuals that die of background causes this step.
    fn departures(&self, population: &Population, rng: &mut RunRng, step: usize) -> IdSet {
        let mut departing = IdSet::default();
        for compartment in Compartment::iter().filter(|c| !c.is_absorbing()) {
            let Some(param) = departure_param(compartment) else {
                continue;
            };
            let rate = self.resolver.resolve(param, step);
            let members = population.members(compartment);
            if rate <= 0.0 || members.is_empty() {
                continue;
            }
            if self.control.d_rand {
                for &id in members {
                    if rng.sample_bool(RngStream::VitalDynamics, rate) {
                        departing.insert(id);
                    }
                }
            } else {
                let expected = (rate * members.len() as f64).round() as usize;
                departing.extend(sample_multiple_from_known_length(
                    rng.get_rng(RngStream::VitalDynamics),
                    members.iter().copied(),
                    expected,
                ));
            }
        }
        departing
    }

    /// Adds this step's arrivals, proportional to the snapshot population size and
    /// distributed over S, E, I and Q.
    fn arrivals(
        &self,
        population: &mut Population,
        rng: &mut RunRng,
        step: usize,
        size: usize,
        occupancy: usize,
    ) -> CompartmentCounts {
        let mut arrivals = CompartmentCounts::default();
        let expected = self.resolver.resolve(Param::ARate, step) * size as f64;
        if expected <= 0.0 {
            return arrivals;
        }
        let n_arrivals = if self.control.a_rand {
            match Poisson::new(expected) {
                Ok(poisson) => {
                    let drawn: f64 = rng.sample_distr(RngStream::VitalDynamics, poisson);
                    drawn as usize
                }
                Err(_) => 0,
            }
        } else {
            expected.round() as usize
        };

        let prop_e = self.resolver.resolve(Param::APropE, step);
        let prop_i = self.resolver.resolve(Param::APropI, step);
        let prop_q = self.resolver.resolve(Param::APropQ, step);
        let weights = [(1.0 - prop_e - prop_i - prop_q).max(0.0), prop_e, prop_i, prop_q];
        let targets = [Compartment::S, Compartment::E, Compartment::I, Compartment::Q];

        for _ in 0..n_arrivals {
            let compartment = rng
                .sample_weighted(RngStream::VitalDynamics, &weights)
                .map_or(Compartment::S, |index| targets[index]);
            let durations = self.entry_durations(compartment, step, occupancy, rng);
            population.add(compartment, step, durations);
            arrivals[compartment] += 1;
        }
        if n_arrivals > 0 {
            trace!("step {step}: {n_arrivals} arrivals");
        }
        arrivals
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::compartment::Event;
    use crate::config::InitialCounts;
    use crate::parameters::ParameterValue;

    fn config(init: InitialCounts, params: &[(&str, f64)]) -> ModelConfig {
        let mut config = ModelConfig {
            nsteps: 50,
            init,
            ..ModelConfig::default()
        };
        for (name, value) in params {
            config.param.insert(*name, *value);
        }
        config
    }

    fn init(s: usize, i: usize, h: usize) -> InitialCounts {
        InitialCounts {
            s,
            e: 0,
            i,
            q: 0,
            h,
            r: 0,
            f: 0,
        }
    }

    fn setup(config: &ModelConfig) -> (ParameterResolver, Population, RunRng) {
        let resolver = config.validate().unwrap();
        (resolver, Population::new(), RunRng::new(42))
    }

    #[test]
    fn initialize_places_counts() {
        let config = config(init(997, 3, 0), &[]);
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        assert_eq!(population.counts(), config.initial_counts());
    }

    #[test]
    fn no_contacts_no_infections() {
        let config = config(init(100, 10, 0), &[("act.rate.i", 0.0), ("act.rate.q", 0.0)]);
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        for step in 1..20 {
            let record = engine.step(&mut population, &mut rng, step).unwrap();
            assert_eq!(record.flows[Transition::Infection], 0);
        }
        assert_eq!(population.count(Compartment::S), 100);
    }

    #[test]
    fn certain_infection_exposes_susceptibles() {
        let config = config(
            init(50, 50, 0),
            &[("act.rate.i", 20.0), ("inf.prob.i", 1.0)],
        );
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        // Exposures are capped at the susceptible supply.
        assert!(record.flows[Transition::Infection] <= 50);
        assert!(record.flows[Transition::Infection] > 40);
        assert_eq!(record.counts[Compartment::E], record.flows[Transition::Infection]);
        for id in population.members(Compartment::E) {
            let events = population.get(*id).unwrap().events();
            assert_eq!(events.get(Event::Exposed), Some(1));
        }
    }

    #[test]
    fn newly_moved_individuals_wait_a_step() {
        // Progression and recovery are certain, but someone exposed at step 1 cannot also
        // progress at step 1.
        let mut config = config(
            init(10, 10, 0),
            &[
                ("act.rate.i", 50.0),
                ("inf.prob.i", 1.0),
                ("prog.rate", 1.0),
                ("rec.rate", 1.0),
                ("hosp.rate", 0.0),
                ("quar.rate", 0.0),
            ],
        );
        config.control.prog_rand = true;
        config.control.rec_rand = true;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());

        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.flows[Transition::Progression], 0);
        assert_eq!(record.flows[Transition::InfectiousRecovery], 10);
        let exposed = record.flows[Transition::Infection];

        let record = engine.step(&mut population, &mut rng, 2).unwrap();
        assert_eq!(record.flows[Transition::Progression], exposed);
        assert_eq!(record.flows[Transition::InfectiousRecovery], 0);
    }

    #[test]
    fn hospitalization_beats_quarantine_and_recovery() {
        let mut config = config(
            init(0, 20, 0),
            &[("hosp.rate", 1.0), ("quar.rate", 1.0), ("rec.rate", 1.0)],
        );
        config.control.rec_rand = true;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.flows[Transition::InfectiousHospitalization], 20);
        assert_eq!(record.flows[Transition::Quarantine], 0);
        assert_eq!(record.flows[Transition::InfectiousRecovery], 0);
    }

    #[test]
    fn fatality_beats_discharge_and_is_absorbing() {
        let config = config(
            init(0, 0, 10),
            &[
                ("fat.rate.base", 1.0),
                ("fat.rate.overcap", 1.0),
                ("disch.rate", 1.0),
            ],
        );
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.flows[Transition::Fatality], 10);
        assert_eq!(record.flows[Transition::Discharge], 0);
        assert_eq!(record.counts[Compartment::F], 10);
        assert_eq!(record.counts.total(), 10);

        let record = engine.step(&mut population, &mut rng, 2).unwrap();
        assert_eq!(record.flows.total(), 0);
        assert_eq!(record.counts[Compartment::F], 10);
    }

    #[test]
    fn overcapacity_fatality_rate() {
        let config = config(
            init(0, 0, 1),
            &[
                ("hosp.cap", 0.0),
                ("fat.tcoeff", 1.0),
                ("fat.rate.base", 0.01),
                ("fat.rate.overcap", 0.3),
            ],
        );
        let (resolver, _, _) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        assert_relative_eq!(engine.fatality_rate(0, 1), 0.3);
        assert_relative_eq!(engine.rate(Transition::Fatality, 10, 1), 0.3);
    }

    #[test]
    fn time_varying_capacity() {
        let mut config = config(
            init(0, 0, 0),
            &[
                ("fat.rate.base", 0.01),
                ("fat.rate.overcap", 0.05),
                ("fat.tcoeff", 1.0),
            ],
        );
        config
            .param
            .insert("hosp.cap", ParameterValue::Series(vec![10.0, 10.0, 0.0]));
        let (resolver, _, _) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        assert_relative_eq!(engine.fatality_rate(1, 5), 0.01);
        assert_relative_eq!(engine.fatality_rate(2, 5), 0.05);
        assert_relative_eq!(engine.fatality_rate(40, 5), 0.05);
    }

    #[test]
    fn duration_mode_fires_after_sampled_time() {
        let mut config = config(
            init(0, 30, 0),
            &[
                ("act.rate.i", 0.0),
                ("hosp.rate", 0.0),
                ("quar.rate", 0.0),
                ("rec.dist.shape", 2.0),
                ("rec.dist.scale", 3.0),
            ],
        );
        config.control = Control::all_random(false);
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let durations: Vec<(IndividualId, f64)> = population
            .members(Compartment::I)
            .iter()
            .map(|id| (*id, population.get(*id).unwrap().duration(2)))
            .collect();

        for step in 1..40 {
            engine.step(&mut population, &mut rng, step).unwrap();
        }
        for (id, duration) in durations {
            let recovered = population.get(id).unwrap().events().get(Event::Recovered);
            // Zero rates give infinite durations for the other exits.
            assert_eq!(population.compartment_of(id), Some(Compartment::R));
            let recovered = recovered.unwrap();
            assert!(recovered as f64 >= duration);
            assert!((recovered as f64) < duration + 1.0 || recovered == 1);
        }
    }

    #[test]
    fn survival_time_sampled_on_hospital_entry() {
        let mut config = config(
            init(0, 0, 1000),
            &[("fat.rate.base", 0.1), ("hosp.cap", 2000.0), ("disch.rate", 0.0)],
        );
        config.nsteps = 200;
        config.control.fat_rand = false;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        assert_eq!(population.count(Compartment::F), 0);
        let survival: Vec<(IndividualId, f64)> = population
            .members(Compartment::H)
            .iter()
            .map(|id| (*id, population.get(*id).unwrap().duration(0)))
            .collect();
        assert_eq!(survival.len(), 1000);

        for step in 1..200 {
            engine.step(&mut population, &mut rng, step).unwrap();
        }
        let mut total = 0.0;
        for (id, duration) in survival {
            let died = population.get(id).unwrap().events().get(Event::Died).unwrap();
            assert!(died >= 1);
            assert!(died as f64 >= duration, "{id:?} died at {died} before {duration}");
            total += died as f64;
        }
        let mean = total / 1000.0;
        // Exponential survival with mean 10, rounded up to the next step.
        assert!((9.0..12.0).contains(&mean), "mean death step {mean}");
        assert_eq!(population.count(Compartment::R), 0);
    }

    #[test]
    fn exponential_fallback_for_rate_only_transitions() {
        let mut config = config(init(0, 0, 0), &[("quar.rate", 0.25), ("hosp.rate", 0.0)]);
        config.control = Control::all_random(false);
        let (resolver, _, _) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        assert_eq!(
            engine.duration_distribution(Transition::Quarantine, 0, 0),
            DurationDistribution::gamma(1.0, 4.0)
        );
        assert_eq!(
            engine.duration_distribution(Transition::InfectiousHospitalization, 0, 0),
            DurationDistribution::Never
        );
        assert_eq!(
            engine.duration_distribution(Transition::Progression, 0, 0),
            DurationDistribution::gamma(1.5, 5.0)
        );
    }

    #[test]
    fn deterministic_departures() {
        let mut config = config(
            init(1000, 0, 0),
            &[("ds.rate", 0.1), ("a.rate", 0.0)],
        );
        config.vital = true;
        config.control.d_rand = false;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.departures[Compartment::S], 100);
        assert_eq!(record.counts[Compartment::S], 900);
        assert_eq!(population.created(), 1000);
    }

    #[test]
    fn the_dead_never_depart() {
        let mut config = config(
            InitialCounts {
                f: 40,
                ..init(60, 0, 0)
            },
            &[("ds.rate", 1.0), ("a.rate", 0.0)],
        );
        config.vital = true;
        config.control.d_rand = false;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.departures[Compartment::S], 60);
        assert_eq!(record.departures[Compartment::F], 0);
        assert_eq!(record.counts[Compartment::F], 40);
        assert_eq!(record.counts.total(), 40);
    }

    #[test]
    fn departure_supersedes_disease_transition() {
        let mut config = config(
            init(0, 10, 0),
            &[("hosp.rate", 1.0), ("di.rate", 1.0), ("a.rate", 0.0)],
        );
        config.vital = true;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.flows.total(), 0);
        assert_eq!(record.departures[Compartment::I], 10);
        assert_eq!(record.counts.total(), 0);
    }

    #[test]
    fn arrivals_follow_proportions() {
        let mut config = config(
            init(1000, 0, 0),
            &[
                ("a.rate", 0.5),
                ("a.prop.e", 0.0),
                ("a.prop.i", 0.0),
                ("a.prop.q", 1.0),
                ("ds.rate", 0.0),
                ("dq.rate", 0.0),
                ("act.rate.q", 0.0),
            ],
        );
        config.vital = true;
        config.control.a_rand = false;
        let (resolver, mut population, mut rng) = setup(&config);
        let engine = TransitionEngine::new(&config, &resolver);
        engine.initialize(&mut population, &mut rng, config.initial_counts());
        let record = engine.step(&mut population, &mut rng, 1).unwrap();
        assert_eq!(record.arrivals[Compartment::Q], 500);
        assert_eq!(record.arrivals.total(), 500);
        let arrival = population.member_at(Compartment::Q, 0).unwrap();
        let events = population.get(arrival).unwrap().events();
        assert_eq!(events.get(Event::Exposed), Some(1));
        assert_eq!(events.get(Event::Infected), Some(1));
        assert_eq!(events.get(Event::Quarantined), Some(1));
    }
}
