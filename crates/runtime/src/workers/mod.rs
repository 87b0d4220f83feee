//! Background tasks owned by the runtime.

mod clock;
mod simulation;

pub(crate) use clock::ClockWorker;
pub(crate) use simulation::{Command, SimulationWorker};
