pub mod error;
pub mod node_class;
pub mod phase;
pub mod price;

pub use error::PricingError;
pub use node_class::NodeClass;
pub use phase::{Phase, PhaseState};
pub use price::{quote_burn, quote_stake, Currency, PriceQuote};
