pub mod reactive;
pub mod sink;
pub mod source_factory;

pub use reactive::{Publisher, Subscriber, Subscription};
pub use sink::Sink;
pub use source_factory::SourceFactory;
