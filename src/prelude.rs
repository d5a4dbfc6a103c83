pub use crate::aggregate::{AggregateSeries, Statistic};
pub use crate::batch::{BatchResult, CancellationToken, SimulationBatch};
pub use crate::compartment::{Compartment, CompartmentCounts, Event, FlowCounts, Transition};
pub use crate::config::{Control, InitialCounts, ModelConfig};
pub use crate::error::ModelError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{Param, ParameterResolver, ParameterSet, ParameterValue};
pub use crate::run::{EventRecord, RunResult, SimulationRun, StepRecord};
