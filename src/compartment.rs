//! The closed sets of tags the model is built from: compartments, the directed
//! transitions between them, and the lifecycle events recorded per individual.
use std::ops::{Index, IndexMut};

use serde_derive::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
    IntoStaticStr,
    strum::Display,
)]
pub enum Compartment {
    S,
    E,
    I,
    Q,
    H,
    R,
    F,
}

impl Compartment {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Members of an absorbing compartment take no further transitions.
    #[must_use]
    pub const fn is_absorbing(self) -> bool {
        matches!(self, Compartment::F)
    }

    /// The compartments whose members make infectious contacts, in the order the
    /// engine evaluates them.
    pub const INFECTIOUS: [Compartment; 3] = [Compartment::E, Compartment::I, Compartment::Q];
}

/// A directed edge of the compartment graph.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
    IntoStaticStr,
    strum::Display,
)]
pub enum Transition {
    #[strum(serialize = "se")]
    Infection,
    #[strum(serialize = "ei")]
    Progression,
    #[strum(serialize = "iq")]
    Quarantine,
    #[strum(serialize = "ih")]
    InfectiousHospitalization,
    #[strum(serialize = "ir")]
    InfectiousRecovery,
    #[strum(serialize = "qh")]
    QuarantinedHospitalization,
    #[strum(serialize = "qr")]
    QuarantinedRecovery,
    #[strum(serialize = "hf")]
    Fatality,
    #[strum(serialize = "hr")]
    Discharge,
}

impl Transition {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn source(self) -> Compartment {
        match self {
            Transition::Infection => Compartment::S,
            Transition::Progression => Compartment::E,
            Transition::Quarantine
            | Transition::InfectiousHospitalization
            | Transition::InfectiousRecovery => Compartment::I,
            Transition::QuarantinedHospitalization | Transition::QuarantinedRecovery => {
                Compartment::Q
            }
            Transition::Fatality | Transition::Discharge => Compartment::H,
        }
    }

    #[must_use]
    pub const fn target(self) -> Compartment {
        match self {
            Transition::Infection => Compartment::E,
            Transition::Progression => Compartment::I,
            Transition::Quarantine => Compartment::Q,
            Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
                Compartment::H
            }
            Transition::InfectiousRecovery
            | Transition::QuarantinedRecovery
            | Transition::Discharge => Compartment::R,
            Transition::Fatality => Compartment::F,
        }
    }

    /// The exits of `compartment`, ordered by precedence: when several fire for the
    /// same individual in the same step, the first one wins.
    #[must_use]
    pub fn exits(compartment: Compartment) -> &'static [Transition] {
        match compartment {
            Compartment::S => &[Transition::Infection],
            Compartment::E => &[Transition::Progression],
            Compartment::I => &[
                Transition::InfectiousHospitalization,
                Transition::Quarantine,
                Transition::InfectiousRecovery,
            ],
            Compartment::Q => &[
                Transition::QuarantinedHospitalization,
                Transition::QuarantinedRecovery,
            ],
            Compartment::H => &[Transition::Fatality, Transition::Discharge],
            Compartment::R | Compartment::F => &[],
        }
    }

    /// The lifecycle events stamped when an individual crosses this edge.
    #[must_use]
    pub fn events(self) -> &'static [Event] {
        match self {
            Transition::Infection => &[Event::Exposed],
            Transition::Progression => &[Event::Infected],
            Transition::Quarantine => &[Event::Quarantined],
            Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
                &[Event::Hospitalized]
            }
            Transition::InfectiousRecovery | Transition::QuarantinedRecovery => {
                &[Event::Recovered]
            }
            Transition::Fatality => &[Event::Died],
            Transition::Discharge => &[Event::Discharged, Event::Recovered],
        }
    }
}

/// A slot in an individual's event-timestamp set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
    IntoStaticStr,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Event {
    Exposed,
    Infected,
    Quarantined,
    Hospitalized,
    Discharged,
    Recovered,
    Died,
    Departed,
}

impl Event {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Events stamped on an individual that enters `compartment` from outside the
    /// disease process, i.e. at initialization or on arrival.
    #[must_use]
    pub fn on_entry(compartment: Compartment) -> &'static [Event] {
        match compartment {
            Compartment::S | Compartment::F => &[],
            Compartment::E => &[Event::Exposed],
            Compartment::I => &[Event::Exposed, Event::Infected],
            Compartment::Q => &[Event::Exposed, Event::Infected, Event::Quarantined],
            Compartment::H => &[Event::Exposed, Event::Infected, Event::Hospitalized],
            Compartment::R => &[Event::Recovered],
        }
    }
}

/// One non-negative count per compartment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompartmentCounts([usize; Compartment::COUNT]);

impl CompartmentCounts {
    #[must_use]
    pub fn new(counts: [usize; Compartment::COUNT]) -> Self {
        Self(counts)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compartment, usize)> + '_ {
        Compartment::iter().map(|compartment| (compartment, self[compartment]))
    }

    #[must_use]
    pub fn as_array(&self) -> &[usize; Compartment::COUNT] {
        &self.0
    }
}

impl Index<Compartment> for CompartmentCounts {
    type Output = usize;

    fn index(&self, compartment: Compartment) -> &usize {
        &self.0[compartment.index()]
    }
}

impl IndexMut<Compartment> for CompartmentCounts {
    fn index_mut(&mut self, compartment: Compartment) -> &mut usize {
        &mut self.0[compartment.index()]
    }
}

/// One non-negative count per transition edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowCounts([usize; Transition::COUNT]);

impl FlowCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Transition, usize)> + '_ {
        Transition::iter().map(|transition| (transition, self[transition]))
    }
}

impl Index<Transition> for FlowCounts {
    type Output = usize;

    fn index(&self, transition: Transition) -> &usize {
        &self.0[transition.index()]
    }
}

impl IndexMut<Transition> for FlowCounts {
    fn index_mut(&mut self, transition: Transition) -> &mut usize {
        &mut self.0[transition.index()]
    }
}
