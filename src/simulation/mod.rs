pub mod behavior;
pub mod collision;
pub mod creatures;
pub mod environment;
pub mod lifecycle;
pub mod pool;
pub mod population;
pub mod steering;
pub mod tick;

pub use behavior::{perceive, plan, Drive, Perception, PlannerContext, SteeringPlan};
pub use environment::{EffectKind, EffectTag, EnvironmentalEffect};
pub use pool::{ObjectPool, PoolHandle, PoolStats, Poolable};
pub use steering::{consult, AxisDirection, SteeringAdvisor, SteeringError, SteeringFeatures};
pub use tick::{run_simulation_tick, run_ticks, Attacker, ModifierTarget, SimulationEvent};
