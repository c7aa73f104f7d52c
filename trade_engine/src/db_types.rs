use std::{fmt::Display, str::FromStr};

pub use auec_common::Auec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::control_id::{ControlAction, ControlId};

//--------------------------------------      Snowflake      ---------------------------------------------------------
/// A Discord identifier (guild, channel, message, role, user or forum tag).
///
/// Snowflakes are 64-bit unsigned integers, which SQLite cannot store natively, so they are kept as text throughout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Snowflake(pub String);

impl Snowflake {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The user-mention markup for this id.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl Display for Snowflake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Snowflake {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Snowflake {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------     TradeStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Listed and accepting buyers.
    Open,
    /// Reserved. No lifecycle transition leads here; only set by direct status updates.
    Matched,
    /// Reserved. No lifecycle transition leads here; only set by direct status updates.
    Escrow,
    /// Closed by the seller.
    Complete,
    /// All stock has been sold.
    SoldOut,
    Cancelled,
    /// Reserved. No lifecycle transition leads here; only set by direct status updates.
    Expired,
}

impl TradeStatus {
    pub const ALL: [TradeStatus; 7] = [
        Self::Open,
        Self::Matched,
        Self::Escrow,
        Self::Complete,
        Self::SoldOut,
        Self::Cancelled,
        Self::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Matched => "matched",
            Self::Escrow => "escrow",
            Self::Complete => "complete",
            Self::SoldOut => "sold_out",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::SoldOut | Self::Cancelled | Self::Expired)
    }
}

impl Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ConversionError(format!("Invalid trade status: {s}")))
    }
}

//--------------------------------------   BuyOrderStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BuyOrderStatus {
    Open,
    Fulfilled,
    Cancelled,
}

impl BuyOrderStatus {
    pub const ALL: [BuyOrderStatus; 3] = [Self::Open, Self::Fulfilled, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl Display for BuyOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuyOrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ConversionError(format!("Invalid buy order status: {s}")))
    }
}

//--------------------------------------     ChannelKind     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Forum,
    Text,
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forum => write!(f, "forum"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl FromStr for ChannelKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forum" => Ok(Self::Forum),
            "text" => Ok(Self::Text),
            s => Err(ConversionError(format!("Invalid channel type: {s}"))),
        }
    }
}

//--------------------------------------       TagKind       ---------------------------------------------------------
/// Which announcements a forum tag is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Sell,
    Buy,
}

impl Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sell => write!(f, "sell"),
            Self::Buy => write!(f, "buy"),
        }
    }
}

impl FromStr for TagKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sell" => Ok(Self::Sell),
            "buy" => Ok(Self::Buy),
            s => Err(ConversionError(format!("Invalid tag kind: {s}"))),
        }
    }
}

//--------------------------------------        Patch        ---------------------------------------------------------
/// A tri-state field update: leave the column alone, set it to NULL, or overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Clear,
        }
    }
}

//--------------------------------------  AnnouncementUpdate ---------------------------------------------------------
/// Changes to a record's announcement pointer and stored control ids.
///
/// Buy orders have a single "done" control, stored from `done_one`. Setting `done_all` on a buy order is a
/// validation error; clearing it is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncementUpdate {
    pub channel_id: Patch<Snowflake>,
    pub message_id: Patch<Snowflake>,
    pub done_one: Patch<String>,
    pub done_all: Patch<String>,
    pub cancel: Patch<String>,
}

impl AnnouncementUpdate {
    pub fn pointer(channel_id: Snowflake, message_id: Snowflake) -> Self {
        Self { channel_id: Patch::Set(channel_id), message_id: Patch::Set(message_id), ..Default::default() }
    }

    pub fn clear_controls() -> Self {
        Self { done_one: Patch::Clear, done_all: Patch::Clear, cancel: Patch::Clear, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.channel_id.is_unchanged() &&
            self.message_id.is_unchanged() &&
            self.done_one.is_unchanged() &&
            self.done_all.is_unchanged() &&
            self.cancel.is_unchanged()
    }
}

//--------------------------------------        Trade        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trade {
    pub id: i64,
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub title: String,
    pub price: Auec,
    pub discount_percent: Option<i64>,
    pub discounted_price: Option<Auec>,
    pub stock: i64,
    pub image_url: Option<String>,
    pub status: TradeStatus,
    pub reason: Option<String>,
    pub announcement_channel_id: Option<Snowflake>,
    pub announcement_message_id: Option<Snowflake>,
    pub control_done_one: Option<String>,
    pub control_done_all: Option<String>,
    pub control_cancel: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// The price a buyer pays right now.
    pub fn final_price(&self) -> Auec {
        self.discounted_price.unwrap_or(self.price)
    }

    pub fn announcement(&self) -> Option<(&Snowflake, &Snowflake)> {
        self.announcement_channel_id.as_ref().zip(self.announcement_message_id.as_ref())
    }

    /// The stored control ids, in display order.
    pub fn controls(&self) -> Vec<(ControlAction, &str)> {
        [
            (ControlAction::TradeDoneOne, &self.control_done_one),
            (ControlAction::TradeDoneAll, &self.control_done_all),
            (ControlAction::TradeCancel, &self.control_cancel),
        ]
        .into_iter()
        .filter_map(|(action, id)| id.as_deref().map(|id| (action, id)))
        .collect()
    }

    pub fn has_control(&self, control_id: &str) -> bool {
        self.controls().iter().any(|(_, id)| *id == control_id)
    }

    pub fn has_controls(&self) -> bool {
        !self.controls().is_empty()
    }

    /// The control ids a trade receives when it is created. "Done all" is only offered when there is more than one
    /// unit in stock.
    pub fn initial_controls(id: i64, stock: i64) -> AnnouncementUpdate {
        let done_all = if stock > 1 {
            Patch::Set(ControlId::new(id, ControlAction::TradeDoneAll).to_string())
        } else {
            Patch::Unchanged
        };
        AnnouncementUpdate {
            done_one: Patch::Set(ControlId::new(id, ControlAction::TradeDoneOne).to_string()),
            done_all,
            cancel: Patch::Set(ControlId::new(id, ControlAction::TradeCancel).to_string()),
            ..Default::default()
        }
    }
}

//--------------------------------------      NewTrade       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub title: String,
    pub price: Auec,
    pub stock: i64,
    pub image_url: Option<String>,
}

impl NewTrade {
    pub fn new<S: Into<String>>(guild_id: Snowflake, user_id: Snowflake, title: S, price: Auec) -> Self {
        Self { guild_id, user_id, title: title.into(), price, stock: 1, image_url: None }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_image(mut self, image_url: String) -> Self {
        self.image_url = Some(image_url);
        self
    }
}

//--------------------------------------      BuyOrder       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuyOrder {
    pub id: i64,
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub item: String,
    pub price: Auec,
    pub amount: Option<i64>,
    pub attachment_url: Option<String>,
    pub status: BuyOrderStatus,
    pub announcement_channel_id: Option<Snowflake>,
    pub announcement_message_id: Option<Snowflake>,
    pub control_done: Option<String>,
    pub control_cancel: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BuyOrder {
    pub fn announcement(&self) -> Option<(&Snowflake, &Snowflake)> {
        self.announcement_channel_id.as_ref().zip(self.announcement_message_id.as_ref())
    }

    pub fn controls(&self) -> Vec<(ControlAction, &str)> {
        [(ControlAction::BuyDone, &self.control_done), (ControlAction::BuyCancel, &self.control_cancel)]
            .into_iter()
            .filter_map(|(action, id)| id.as_deref().map(|id| (action, id)))
            .collect()
    }

    pub fn has_control(&self, control_id: &str) -> bool {
        self.controls().iter().any(|(_, id)| *id == control_id)
    }

    pub fn has_controls(&self) -> bool {
        !self.controls().is_empty()
    }

    pub fn initial_controls(id: i64) -> AnnouncementUpdate {
        AnnouncementUpdate {
            done_one: Patch::Set(ControlId::new(id, ControlAction::BuyDone).to_string()),
            cancel: Patch::Set(ControlId::new(id, ControlAction::BuyCancel).to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBuyOrder {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub item: String,
    pub price: Auec,
    pub amount: Option<i64>,
    pub attachment_url: Option<String>,
}

impl NewBuyOrder {
    pub fn new<S: Into<String>>(guild_id: Snowflake, user_id: Snowflake, item: S, price: Auec) -> Self {
        Self { guild_id, user_id, item: item.into(), price, amount: None, attachment_url: None }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_attachment(mut self, url: String) -> Self {
        self.attachment_url = Some(url);
        self
    }
}

//--------------------------------------        Guild        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub admin_role_id: Option<Snowflake>,
    pub trade_channel_id: Option<Snowflake>,
    pub trade_channel_type: Option<ChannelKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    /// The configured announcement channel, if both halves of the configuration are present.
    pub fn trade_channel(&self) -> Option<(&Snowflake, ChannelKind)> {
        self.trade_channel_id.as_ref().zip(self.trade_channel_type)
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub discriminator: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.username.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub discriminator: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(id: Snowflake, username: S) -> Self {
        Self { id, username: username.into(), display_name: None, discriminator: None }
    }

    pub fn with_display_name(mut self, name: String) -> Self {
        self.display_name = Some(name);
        self
    }

    pub fn with_discriminator(mut self, discriminator: String) -> Self {
        self.discriminator = Some(discriminator);
        self
    }
}

//--------------------------------------   CommandHistory    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct CommandHistoryEntry {
    pub guild_id: Option<Snowflake>,
    pub user_id: Option<Snowflake>,
    pub command_name: String,
    pub options: serde_json::Value,
}
