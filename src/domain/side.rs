use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What the oracle recommends. HOLD never reaches the execution path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    #[default]
    Hold,
}

/// Direction of an actual order. Deliberately has no Hold variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl TryFrom<SignalAction> for OrderSide {
    type Error = anyhow::Error;

    fn try_from(action: SignalAction) -> Result<Self, Self::Error> {
        match action {
            SignalAction::Buy => Ok(OrderSide::Buy),
            SignalAction::Sell => Ok(OrderSide::Sell),
            SignalAction::Hold => anyhow::bail!("HOLD signals are not executable"),
        }
    }
}
