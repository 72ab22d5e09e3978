//! Event envelope, bus abstraction, and the async utilities the runtime
//! layers retry/timeout/delay on top of.

pub mod bus;
pub mod clock;
pub mod envelope;
pub mod id_gen;
pub mod in_memory_bus;
pub mod remote_bus;
pub mod retry;
pub mod timeout;

pub use bus::{BusError, EventBus};
pub use clock::{delay, Clock, FixedClock, SystemClock};
pub use envelope::{EnvelopeError, EventEnvelope};
pub use id_gen::{IdGenerator, SequentialIdGenerator, UuidV4Generator};
pub use in_memory_bus::InMemoryEventBus;
pub use remote_bus::RemoteEventBusClient;
pub use retry::{publish_with_retry, RetryPolicy};
pub use timeout::{with_timeout, TimeoutError};
