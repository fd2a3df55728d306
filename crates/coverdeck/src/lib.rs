pub mod api;
pub mod cards;
pub mod config;
pub mod host;
pub mod view;

pub use cards::Card;
pub use cards::CoverCard;
pub use cards::CoverConfig;
pub use config::Config;
pub use config::LogLevel;
pub use host::Host;
pub use host::ServiceBus;
pub use host::ServiceCall;
pub use host::StateSnapshot;
pub use view::View;
