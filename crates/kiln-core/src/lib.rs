//! # Kiln Controller Core
//!
//! The control core for a single-element electric ceramic kiln: everything
//! between the thermocouple reading and the solid-state relay that switches
//! the heating element.
//!
//! ## Architecture
//!
//! Three cooperating actors share a handful of small, copy-on-read cells:
//!
//! * The **sensor sampler** (owned by the runtime) decodes thermocouple
//!   frames and publishes them into a [`sensor::ReadingCell`].
//! * The **safety supervisor** ([`safety::SafetySupervisor`]) is the only
//!   writer of the SSR output. It turns the commanded duty cycle into
//!   time-proportional pulses and enforces the hard temperature ceiling, the
//!   sensor-fault deadline, and the emergency-stop latch.
//! * The **firing engine** ([`engine::FiringEngine`]) walks a
//!   [`profile::FiringProfile`] segment by segment, produces setpoints for
//!   the PID loop, and publishes the desired duty. It never drives the SSR
//!   itself and never blocks on the supervisor: the two communicate through
//!   the duty cell and the [`events::EventGroup`] emergency bit.
//!
//! Time is always passed in: the engine and supervisor take monotonic
//! microsecond timestamps per step, so the whole core runs unmodified
//! against a simulated clock.

pub mod clock;
pub mod command;
pub mod cone;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod persist;
pub mod profile;
pub mod progress;
pub mod safety;
pub mod sensor;
pub mod settings;

pub use command::{Command, CommandError, CommandInbox};
pub use engine::{ElementCounter, EngineHandles, FiringEngine};
pub use error::{ErrorCell, FiringErrorCode};
pub use events::EventGroup;
pub use history::{FiringOutcome, HistoryRecord};
pub use persist::{PersistError, Persistence};
pub use profile::{FiringProfile, FiringSegment};
pub use progress::{FiringProgress, FiringStatus, ProgressCell};
pub use safety::{SafetySupervisor, SsrCommand};
pub use sensor::{ReadingCell, ThermocoupleReading};
pub use settings::{KilnSettings, SharedSettings, TempUnit};
