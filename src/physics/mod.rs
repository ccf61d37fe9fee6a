mod adapter;
mod forces;
mod radial;
mod simulation;

pub use adapter::SimulationAdapter;
