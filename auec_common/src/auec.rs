use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

pub const AUEC_CURRENCY_CODE: &str = "aUEC";

//--------------------------------------        Auec        ---------------------------------------------------------
/// An amount of the in-game currency. Prices are always whole units.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Auec(i64);

impl From<i64> for Auec {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Auec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {AUEC_CURRENCY_CODE}", self.0)
    }
}

impl Auec {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
