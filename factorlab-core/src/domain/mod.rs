//! Domain types for FactorLab

pub mod cross_section;
pub mod equity;
pub mod holdings;
pub mod panel;
pub mod trade;

pub use cross_section::CrossSection;
pub use equity::{EquityCurve, EquityPoint, EquityRow};
pub use holdings::Holdings;
pub use panel::{AlignedPair, PanelError, PanelWindow, PricePanel};
pub use trade::{TradeLog, TradeRecord};
