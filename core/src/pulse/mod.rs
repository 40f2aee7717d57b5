pub mod pool;
pub mod record;
pub mod source;

pub use pool::PulsePool;
pub use record::Pulse;
pub use source::{ChannelPulseSource, PulseSender, PulseSource, SourceInfo, VecPulseSource};
