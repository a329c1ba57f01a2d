//! Engine process management
//!
//! Spawning, stdin writes, output relaying and lifecycle supervision of
//! the engine child process.

pub mod input;
pub mod relay;
pub mod spawn;
pub mod supervisor;

pub use input::EngineInput;
pub use relay::Relay;
pub use spawn::{spawn_engine, SpawnedEngine};
pub use supervisor::{Supervisor, SupervisorState, GRACE_PERIOD, SHUTDOWN_SENTINEL};
