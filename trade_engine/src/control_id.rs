//! Button identifiers.
//!
//! Every button on an announcement carries a control id that names the record and the action it triggers:
//!
//! ```text
//! control-id  = trade-id / buy-id
//! trade-id    = "trade:" record-id ":" ( "done:one" / "done:all" / "cancel" )
//! buy-id      = "buy:" record-id ":" ( "done" / "cancel" )
//! record-id   = 1*DIGIT        ; positive i64
//! ```
//!
//! Parsing never panics. Anything outside the grammar yields [`ControlIdError::InvalidIdentifier`].
use std::{fmt::Display, str::FromStr, sync::OnceLock};

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlIdError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    TradeDoneOne,
    TradeDoneAll,
    TradeCancel,
    BuyDone,
    BuyCancel,
}

impl ControlAction {
    pub fn is_trade(&self) -> bool {
        matches!(self, Self::TradeDoneOne | Self::TradeDoneAll | Self::TradeCancel)
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::TradeCancel | Self::BuyCancel)
    }

    /// Button caption
    pub fn label(&self) -> &'static str {
        match self {
            Self::TradeDoneOne => "Sold 1",
            Self::TradeDoneAll => "Sold all",
            Self::TradeCancel => "Cancel",
            Self::BuyDone => "Fulfilled",
            Self::BuyCancel => "Cancel",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::TradeDoneOne => "done:one",
            Self::TradeDoneAll => "done:all",
            Self::TradeCancel | Self::BuyCancel => "cancel",
            Self::BuyDone => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId {
    pub record_id: i64,
    pub action: ControlAction,
}

impl ControlId {
    pub fn new(record_id: i64, action: ControlAction) -> Self {
        Self { record_id, action }
    }
}

impl Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.action.is_trade() { "trade" } else { "buy" };
        write!(f, "{prefix}:{}:{}", self.record_id, self.action.suffix())
    }
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^(?:trade:(\d+):(done:one|done:all|cancel)|buy:(\d+):(done|cancel))$")
            .expect("Control id grammar is not a valid regex")
    })
}

impl FromStr for ControlId {
    type Err = ControlIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ControlIdError::InvalidIdentifier(s.to_string());
        let caps = grammar().captures(s).ok_or_else(invalid)?;
        let (id, action) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(id), Some(action), _, _) => {
                let action = match action.as_str() {
                    "done:one" => ControlAction::TradeDoneOne,
                    "done:all" => ControlAction::TradeDoneAll,
                    _ => ControlAction::TradeCancel,
                };
                (id.as_str(), action)
            },
            (_, _, Some(id), Some(action)) => {
                let action = if action.as_str() == "done" { ControlAction::BuyDone } else { ControlAction::BuyCancel };
                (id.as_str(), action)
            },
            _ => return Err(invalid()),
        };
        let record_id = id.parse::<i64>().map_err(|_| invalid())?;
        if record_id < 1 {
            return Err(invalid());
        }
        Ok(Self { record_id, action })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_the_grammar() {
        assert_eq!(ControlId::new(12, ControlAction::TradeDoneOne).to_string(), "trade:12:done:one");
        assert_eq!(ControlId::new(12, ControlAction::TradeDoneAll).to_string(), "trade:12:done:all");
        assert_eq!(ControlId::new(3, ControlAction::TradeCancel).to_string(), "trade:3:cancel");
        assert_eq!(ControlId::new(5, ControlAction::BuyDone).to_string(), "buy:5:done");
        assert_eq!(ControlId::new(5, ControlAction::BuyCancel).to_string(), "buy:5:cancel");
    }

    #[test]
    fn parses_valid_ids() {
        let id: ControlId = "trade:42:done:all".parse().unwrap();
        assert_eq!(id, ControlId::new(42, ControlAction::TradeDoneAll));
        let id: ControlId = "buy:9:cancel".parse().unwrap();
        assert_eq!(id, ControlId::new(9, ControlAction::BuyCancel));
    }

    #[test]
    fn rejects_anything_else() {
        for bad in [
            "",
            "trade",
            "trade:1",
            "trade:1:done",
            "buy:1:done:one",
            "trade:-1:cancel",
            "trade:0:cancel",
            "trade:abc:cancel",
            "trade:1:cancel:extra",
            " trade:1:cancel",
            "sell:1:cancel",
            "trade:99999999999999999999:cancel",
        ] {
            assert_eq!(
                bad.parse::<ControlId>(),
                Err(ControlIdError::InvalidIdentifier(bad.to_string())),
                "{bad} should not parse"
            );
        }
    }
}
