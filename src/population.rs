//! The population of a run: an arena of individual records addressed by index, and one
//! index set per compartment.
//!
//! Records are never removed from the arena. An individual that departs (background
//! death) leaves every compartment set but keeps its record, so its event timestamps stay
//! available for the event log. Individuals in F remain members of F: they count towards
//! the population size but take no further transitions.
use std::fmt;

use indexmap::IndexSet;
use log::trace;
use rustc_hash::FxBuildHasher;
use serde_derive::Serialize;
use strum::{EnumCount, IntoEnumIterator};

use crate::compartment::{Compartment, CompartmentCounts, Event, Transition};

/// The most exits any compartment has (I: hospitalization, quarantine, recovery).
pub const MAX_EXITS: usize = 3;

/// Residence times sampled on entry, one per exit of the compartment in the order of
/// [`Transition::exits`]. Unused slots are infinite.
pub type ExitDurations = [f64; MAX_EXITS];

/// Durations for a compartment whose exits are all drawn per step.
pub const NO_DURATIONS: ExitDurations = [f64::INFINITY; MAX_EXITS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IndividualId(usize);

impl IndividualId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write-once event timestamps. `None` means the event did not occur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTimestamps([Option<usize>; Event::COUNT]);

impl EventTimestamps {
    #[must_use]
    pub fn get(&self, event: Event) -> Option<usize> {
        self.0[event.index()]
    }

    /// Records `event` at `step` unless it was already recorded. Returns whether the
    /// timestamp was written.
    pub fn set(&mut self, event: Event, step: usize) -> bool {
        let slot = &mut self.0[event.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(step);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (Event, Option<usize>)> + '_ {
        Event::iter().map(|event| (event, self.get(event)))
    }
}

#[derive(Debug, Clone)]
pub struct Individual {
    compartment: Option<Compartment>,
    entered_at: usize,
    durations: ExitDurations,
    events: EventTimestamps,
}

impl Individual {
    /// The current compartment, or `None` once departed.
    #[must_use]
    pub fn compartment(&self) -> Option<Compartment> {
        self.compartment
    }

    /// The step at which the individual entered its current compartment.
    #[must_use]
    pub fn entered_at(&self) -> usize {
        self.entered_at
    }

    /// The residence time sampled for exit `exit` of the current compartment.
    #[must_use]
    pub fn duration(&self, exit: usize) -> f64 {
        self.durations[exit]
    }

    #[must_use]
    pub fn events(&self) -> &EventTimestamps {
        &self.events
    }
}

type MemberSet = IndexSet<IndividualId, FxBuildHasher>;

#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
    members: [MemberSet; Compartment::COUNT],
    size: usize,
}

impl Population {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an individual to `compartment`, stamping the events implied by entering it
    /// directly (see [`Event::on_entry`]).
    pub fn add(
        &mut self,
        compartment: Compartment,
        step: usize,
        durations: ExitDurations,
    ) -> IndividualId {
        let id = IndividualId(self.individuals.len());
        let mut events = EventTimestamps::default();
        for event in Event::on_entry(compartment) {
            events.set(*event, step);
        }
        self.individuals.push(Individual {
            compartment: Some(compartment),
            entered_at: step,
            durations,
            events,
        });
        self.members[compartment.index()].insert(id);
        self.size += 1;
        id
    }

    /// Moves `id` across `transition` at `step`. Returns `false` (and does nothing) if the
    /// individual is not currently in the transition's source compartment.
    pub fn apply(
        &mut self,
        id: IndividualId,
        transition: Transition,
        step: usize,
        durations: ExitDurations,
    ) -> bool {
        let source = transition.source();
        let target = transition.target();
        if !self.members[source.index()].swap_remove(&id) {
            return false;
        }
        self.members[target.index()].insert(id);
        let individual = &mut self.individuals[id.0];
        individual.compartment = Some(target);
        individual.entered_at = step;
        individual.durations = durations;
        for event in transition.events() {
            individual.events.set(*event, step);
        }
        true
    }

    /// Removes `id` from the population at `step`. Returns the compartment it left, or
    /// `None` if it had already departed.
    pub fn depart(&mut self, id: IndividualId, step: usize) -> Option<Compartment> {
        let individual = self.individuals.get_mut(id.0)?;
        let compartment = individual.compartment.take()?;
        self.members[compartment.index()].swap_remove(&id);
        individual.events.set(Event::Departed, step);
        self.size -= 1;
        trace!("individual {id} departed from {compartment} at step {step}");
        Some(compartment)
    }

    #[must_use]
    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.get(id.0)
    }

    #[must_use]
    pub fn compartment_of(&self, id: IndividualId) -> Option<Compartment> {
        self.get(id)?.compartment
    }

    #[must_use]
    pub fn contains(&self, compartment: Compartment, id: IndividualId) -> bool {
        self.members[compartment.index()].contains(&id)
    }

    /// The members of `compartment`, in an arbitrary but deterministic order.
    #[must_use]
    pub fn members(&self, compartment: Compartment) -> &MemberSet {
        &self.members[compartment.index()]
    }

    /// The member of `compartment` at `position`, for uniform draws.
    #[must_use]
    pub fn member_at(&self, compartment: Compartment, position: usize) -> Option<IndividualId> {
        self.members[compartment.index()].get_index(position).copied()
    }

    #[must_use]
    pub fn count(&self, compartment: Compartment) -> usize {
        self.members[compartment.index()].len()
    }

    #[must_use]
    pub fn counts(&self) -> CompartmentCounts {
        let mut counts = CompartmentCounts::default();
        for compartment in Compartment::iter() {
            counts[compartment] = self.count(compartment);
        }
        counts
    }

    /// Individuals that have not departed, F included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Individuals that can make contacts: not departed and not in F.
    #[must_use]
    pub fn living(&self) -> usize {
        self.size - self.count(Compartment::F)
    }

    /// Every individual ever created, departed ones included.
    #[must_use]
    pub fn created(&self) -> usize {
        self.individuals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndividualId, &Individual)> {
        self.individuals
            .iter()
            .enumerate()
            .map(|(index, individual)| (IndividualId(index), individual))
    }

    /// Checks that the compartment sets agree with the tracked population size.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch.
    pub fn verify(&self) -> Result<(), String> {
        let counted = self.counts().total();
        if counted != self.size {
            return Err(format!(
                "compartment sets hold {counted} individuals but the population size is {}",
                self.size
            ));
        }
        let departed = self
            .individuals
            .iter()
            .filter(|individual| individual.compartment.is_none())
            .count();
        if departed + self.size != self.individuals.len() {
            return Err(format!(
                "{} records, {} departed and {} present",
                self.individuals.len(),
                departed,
                self.size
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(counts: &[(Compartment, usize)]) -> Population {
        let mut population = Population::new();
        for (compartment, n) in counts {
            for _ in 0..*n {
                population.add(*compartment, 0, NO_DURATIONS);
            }
        }
        population
    }

    #[test]
    fn add_and_count() {
        let population = population(&[(Compartment::S, 997), (Compartment::I, 3)]);
        assert_eq!(population.size(), 1000);
        assert_eq!(population.count(Compartment::S), 997);
        assert_eq!(population.count(Compartment::I), 3);
        assert_eq!(population.counts().total(), 1000);
        assert!(population.verify().is_ok());
    }

    #[test]
    fn entry_events_are_stamped() {
        let mut population = Population::new();
        let s = population.add(Compartment::S, 0, NO_DURATIONS);
        let q = population.add(Compartment::Q, 4, NO_DURATIONS);
        let events = population.get(q).unwrap().events();
        assert_eq!(events.get(Event::Exposed), Some(4));
        assert_eq!(events.get(Event::Infected), Some(4));
        assert_eq!(events.get(Event::Quarantined), Some(4));
        assert_eq!(events.get(Event::Hospitalized), None);
        assert!(population
            .get(s)
            .unwrap()
            .events()
            .iter()
            .all(|(_, step)| step.is_none()));
    }

    #[test]
    fn apply_moves_between_sets() {
        let mut population = population(&[(Compartment::S, 2)]);
        let id = population.member_at(Compartment::S, 0).unwrap();
        let durations = [2.5, f64::INFINITY, f64::INFINITY];
        assert!(population.apply(id, Transition::Infection, 3, durations));
        assert!(population.contains(Compartment::E, id));
        assert!(!population.contains(Compartment::S, id));
        let individual = population.get(id).unwrap();
        assert_eq!(individual.entered_at(), 3);
        assert_eq!(individual.duration(0), 2.5);
        assert_eq!(individual.events().get(Event::Exposed), Some(3));

        // Not in the source compartment any more.
        assert!(!population.apply(id, Transition::Infection, 4, NO_DURATIONS));
        assert_eq!(population.get(id).unwrap().events().get(Event::Exposed), Some(3));
    }

    #[test]
    fn discharge_stamps_recovery_too() {
        let mut population = population(&[(Compartment::H, 1)]);
        let id = population.member_at(Compartment::H, 0).unwrap();
        population.apply(id, Transition::Discharge, 9, NO_DURATIONS);
        let events = population.get(id).unwrap().events();
        assert_eq!(events.get(Event::Discharged), Some(9));
        assert_eq!(events.get(Event::Recovered), Some(9));
    }

    #[test]
    fn timestamps_are_write_once() {
        let mut events = EventTimestamps::default();
        assert!(events.set(Event::Exposed, 2));
        assert!(!events.set(Event::Exposed, 5));
        assert_eq!(events.get(Event::Exposed), Some(2));
    }

    #[test]
    fn departure_keeps_record() {
        let mut population = population(&[(Compartment::R, 3), (Compartment::F, 1)]);
        let id = population.member_at(Compartment::R, 1).unwrap();
        assert_eq!(population.depart(id, 6), Some(Compartment::R));
        assert_eq!(population.depart(id, 7), None);
        assert_eq!(population.size(), 3);
        assert_eq!(population.living(), 2);
        assert_eq!(population.created(), 4);
        assert_eq!(population.compartment_of(id), None);
        assert_eq!(
            population.get(id).unwrap().events().get(Event::Departed),
            Some(6)
        );
        assert!(population.verify().is_ok());
    }
}
