//! Announcement rendering.
//!
//! Pure functions from a record's persisted state (plus its owner's display name) to what the announcement shows.
//! Nothing here touches the database or the network, so the same record always renders the same way.
use crate::{
    control_id::ControlAction,
    db_types::{Auec, BuyOrder, BuyOrderStatus, Snowflake, Trade, TradeStatus},
};

/// Discord's limit on channel and thread names.
pub const MAX_THREAD_NAME_CHARS: usize = 100;

pub const COLOR_OPEN: u32 = 0x2E_CC71;
pub const COLOR_CLOSED: u32 = 0x95_A5A6;
pub const COLOR_CANCELLED: u32 = 0xE7_4C3C;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFieldView {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedFieldView {
    fn inline<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self { name: name.into(), value: value.into(), inline: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedView {
    pub title: String,
    pub fields: Vec<EmbedFieldView>,
    pub footer: String,
    pub image_url: Option<String>,
    pub color: u32,
}

impl EmbedView {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub action: ControlAction,
    pub custom_id: String,
    pub label: &'static str,
}

/// Everything needed to post or patch an announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementView {
    pub content: String,
    pub embed: EmbedView,
    pub thread_name: String,
    pub controls: Vec<ControlView>,
}

pub fn trade_status_label(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::Open => "Open",
        TradeStatus::SoldOut => "Sold",
        TradeStatus::Complete => "Closed",
        TradeStatus::Cancelled => "Cancelled",
        TradeStatus::Matched => "Matched",
        TradeStatus::Escrow => "In Escrow",
        TradeStatus::Expired => "Expired",
    }
}

pub fn buy_order_status_label(status: BuyOrderStatus) -> &'static str {
    match status {
        BuyOrderStatus::Open => "Open",
        BuyOrderStatus::Fulfilled => "Fulfilled",
        BuyOrderStatus::Cancelled => "Cancelled",
    }
}

fn trade_glyph(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::SoldOut | TradeStatus::Complete => "✅",
        TradeStatus::Cancelled => "❌",
        TradeStatus::Expired => "⌛",
        _ => "⏸",
    }
}

fn buy_order_glyph(status: BuyOrderStatus) -> &'static str {
    match status {
        BuyOrderStatus::Fulfilled => "✅",
        BuyOrderStatus::Cancelled => "❌",
        BuyOrderStatus::Open => "⏸",
    }
}

fn trade_color(status: TradeStatus) -> u32 {
    match status {
        TradeStatus::Open => COLOR_OPEN,
        TradeStatus::Cancelled => COLOR_CANCELLED,
        _ => COLOR_CLOSED,
    }
}

fn buy_order_color(status: BuyOrderStatus) -> u32 {
    match status {
        BuyOrderStatus::Open => COLOR_OPEN,
        BuyOrderStatus::Fulfilled => COLOR_CLOSED,
        BuyOrderStatus::Cancelled => COLOR_CANCELLED,
    }
}

/// Cuts `name` down to Discord's thread name limit without splitting a character.
pub fn truncate_thread_name(name: &str) -> String {
    name.chars().take(MAX_THREAD_NAME_CHARS).collect()
}

fn decorate_thread_name(base: String, open: bool, glyph: &str, label: &str) -> String {
    let name = if open { base } else { format!("{glyph} {base} [{label}]") };
    truncate_thread_name(&name)
}

pub fn trade_thread_name(trade: &Trade, label: &str) -> String {
    let base = format!("Sell: {} - {}", trade.title, trade.price);
    decorate_thread_name(base, trade.status == TradeStatus::Open, trade_glyph(trade.status), label)
}

pub fn buy_order_thread_name(order: &BuyOrder, label: &str) -> String {
    let base = format!("Buy: {} - {}", order.item, order.price);
    decorate_thread_name(base, order.status == BuyOrderStatus::Open, buy_order_glyph(order.status), label)
}

pub fn trade_content(trade: &Trade) -> String {
    let discount = match trade.discount_percent {
        Some(p) if trade.discounted_price.is_some() => format!(" ({p}% off)"),
        _ => String::new(),
    };
    format!("New trade from {} — {}{discount}", trade.user_id.mention(), trade.final_price())
}

pub fn buy_order_content(order: &BuyOrder) -> String {
    let amount = order.amount.map(|a| format!(" for {a} unit(s)")).unwrap_or_default();
    format!("New buy order from {} — Offering {}{amount}", order.user_id.mention(), order.price)
}

fn controls(open: bool, stored: Vec<(ControlAction, &str)>) -> Vec<ControlView> {
    if !open {
        return Vec::new();
    }
    stored
        .into_iter()
        .map(|(action, id)| ControlView { action, custom_id: id.to_string(), label: action.label() })
        .collect()
}

/// "Sold all" only makes sense while more than one unit is left.
fn trade_controls(trade: &Trade) -> Vec<(ControlAction, &str)> {
    trade
        .controls()
        .into_iter()
        .filter(|(action, _)| *action != ControlAction::TradeDoneAll || trade.stock > 1)
        .collect()
}

fn price_fields(price: Auec, discount: Option<(i64, Auec)>) -> Vec<EmbedFieldView> {
    match discount {
        Some((percent, discounted)) => vec![
            EmbedFieldView::inline("Original price", format!("~~{price}~~")),
            EmbedFieldView::inline("Discount", format!("{percent}%")),
            EmbedFieldView::inline("Price", discounted.to_string()),
        ],
        None => vec![EmbedFieldView::inline("Price", price.to_string())],
    }
}

/// Renders a trade. `label_override` replaces the status label (e.g. to show a transient state).
pub fn render_trade(trade: &Trade, owner_name: &str, label_override: Option<&str>) -> AnnouncementView {
    let label = label_override.unwrap_or(trade_status_label(trade.status));
    let mut fields = price_fields(trade.price, trade.discount_percent.zip(trade.discounted_price));
    fields.push(EmbedFieldView::inline("Stock", trade.stock.to_string()));
    fields.push(EmbedFieldView::inline("ID", format!("#{}", trade.id)));
    fields.push(EmbedFieldView::inline("Status", label));
    if let Some(reason) = trade.reason.as_ref().filter(|_| trade.status == TradeStatus::Cancelled) {
        fields.push(EmbedFieldView { name: "Reason".into(), value: reason.clone(), inline: false });
    }
    let embed = EmbedView {
        title: trade.title.clone(),
        fields,
        footer: format!("Seller: {owner_name}"),
        image_url: trade.image_url.clone(),
        color: trade_color(trade.status),
    };
    AnnouncementView {
        content: trade_content(trade),
        embed,
        thread_name: trade_thread_name(trade, label),
        controls: controls(trade.status == TradeStatus::Open, trade_controls(trade)),
    }
}

pub fn render_buy_order(order: &BuyOrder, owner_name: &str, label_override: Option<&str>) -> AnnouncementView {
    let label = label_override.unwrap_or(buy_order_status_label(order.status));
    let mut fields = price_fields(order.price, None);
    if let Some(amount) = order.amount {
        fields.push(EmbedFieldView::inline("Amount", amount.to_string()));
    }
    fields.push(EmbedFieldView::inline("ID", format!("#{}", order.id)));
    fields.push(EmbedFieldView::inline("Status", label));
    let embed = EmbedView {
        title: order.item.clone(),
        fields,
        footer: format!("Buyer: {owner_name}"),
        image_url: order.attachment_url.clone(),
        color: buy_order_color(order.status),
    };
    AnnouncementView {
        content: buy_order_content(order),
        embed,
        thread_name: buy_order_thread_name(order, label),
        controls: controls(order.status == BuyOrderStatus::Open, order.controls()),
    }
}

/// `https://{host}/channels/{guild}/{channel}/{message}`
pub fn announcement_link(host: &str, guild: &Snowflake, channel: &Snowflake, message: &Snowflake) -> String {
    format!("https://{host}/channels/{guild}/{channel}/{message}")
}
