use std::str::FromStr;

use discord_tools::data_objects::{CommandOption, InteractionData, ResolvedData, OPTION_SUB_COMMAND};
use serde_json::{Map, Value};
use thiserror::Error;
use trade_engine::{
    db_types::{ChannelKind, Snowflake, TagKind},
    DoneAmount,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("I don't know the command `{0}`.")]
    UnknownCommand(String),
    #[error("The `{0}` option is required.")]
    MissingOption(&'static str),
    #[error("The `{name}` option is invalid. {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

impl CommandError {
    fn invalid<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Self::InvalidOption { name, reason: reason.into() }
    }
}

/// Every slash command the bot understands, with its options already typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTrade { title: String, price: i64, stock: Option<i64>, image_url: Option<String> },
    TradeDone { id: i64, amount: DoneAmount },
    Discount { id: i64, percent: Option<i64> },
    CancelTrade { id: i64, reason: Option<String> },
    CloseTrade { id: i64 },
    CloseAllTrades,
    SellOutAllTrades,
    ListTrades,
    CreateBuyOrder { item: String, price: i64, amount: Option<i64>, attachment_url: Option<String> },
    FulfilBuyOrder { id: i64 },
    CancelBuyOrder { id: i64 },
    FulfilAllBuyOrders,
    ListBuyOrders,
    SetTradeChannel { channel: Option<Snowflake>, kind: Option<ChannelKind> },
    SetAdminRole { role: Option<Snowflake> },
    AddModeratorRole { role: Snowflake },
    RemoveModeratorRole { role: Snowflake },
    ListModeratorRoles,
    AddForumTag { kind: TagKind, tag: Snowflake },
    RemoveForumTag { kind: TagKind, tag: Snowflake },
    ListForumTags { kind: TagKind },
    ModCancelTrade { id: i64, reason: Option<String> },
    ModCancelBuyOrder { id: i64 },
}

/// The leaf options of an invocation, plus whatever Discord resolved for them.
pub struct Options<'a> {
    options: &'a [CommandOption],
    resolved: Option<&'a ResolvedData>,
}

impl<'a> Options<'a> {
    pub fn new(options: &'a [CommandOption], resolved: Option<&'a ResolvedData>) -> Self {
        Self { options, resolved }
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        self.options.iter().find(|o| o.name == name).and_then(|o| o.value.as_ref())
    }

    pub fn string(&self, name: &'static str) -> Result<Option<String>, CommandError> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v) => Err(CommandError::invalid(name, format!("Expected text, got {v}."))),
        }
    }

    pub fn integer(&self, name: &'static str) -> Result<Option<i64>, CommandError> {
        match self.value(name) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| CommandError::invalid(name, "Expected a whole number.")),
        }
    }

    pub fn boolean(&self, name: &'static str) -> Result<Option<bool>, CommandError> {
        match self.value(name) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| CommandError::invalid(name, "Expected true or false.")),
        }
    }

    /// Channel, role and user options arrive as their id.
    pub fn snowflake(&self, name: &'static str) -> Result<Option<Snowflake>, CommandError> {
        Ok(self.string(name)?.map(Snowflake::from))
    }

    pub fn parsed<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, CommandError>
    where T::Err: ToString {
        self.string(name)?.map(|s| s.parse::<T>().map_err(|e| CommandError::invalid(name, e.to_string()))).transpose()
    }

    /// Attachment options carry an attachment id; the URL lives in the resolved data.
    pub fn attachment_url(&self, name: &'static str) -> Result<Option<String>, CommandError> {
        let Some(id) = self.string(name)? else {
            return Ok(None);
        };
        self.resolved
            .and_then(|r| r.attachments.get(&id))
            .map(|a| Some(a.url.clone()))
            .ok_or_else(|| CommandError::invalid(name, "The attachment could not be found."))
    }

    pub fn required_string(&self, name: &'static str) -> Result<String, CommandError> {
        self.string(name)?.ok_or(CommandError::MissingOption(name))
    }

    pub fn required_integer(&self, name: &'static str) -> Result<i64, CommandError> {
        self.integer(name)?.ok_or(CommandError::MissingOption(name))
    }

    pub fn required_snowflake(&self, name: &'static str) -> Result<Snowflake, CommandError> {
        self.snowflake(name)?.ok_or(CommandError::MissingOption(name))
    }

    pub fn required<T: FromStr>(&self, name: &'static str) -> Result<T, CommandError>
    where T::Err: ToString {
        self.parsed(name)?.ok_or(CommandError::MissingOption(name))
    }

    /// The options as a flat JSON object, for the audit log.
    pub fn to_json(&self) -> Value {
        let map = self
            .options
            .iter()
            .map(|o| (o.name.clone(), o.value.clone().unwrap_or(Value::Null)))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}

/// An application command split into its name path (`trade create`) and leaf options.
pub struct Invocation<'a> {
    pub command: &'a str,
    pub subcommand: Option<&'a str>,
    pub options: Options<'a>,
}

impl<'a> Invocation<'a> {
    pub fn from_data(data: &'a InteractionData) -> Result<Self, CommandError> {
        let command = data.name.as_deref().ok_or_else(|| CommandError::UnknownCommand(String::new()))?;
        let resolved = data.resolved.as_ref();
        let invocation = match data.options.iter().find(|o| o.kind == OPTION_SUB_COMMAND) {
            Some(sub) => Self {
                command,
                subcommand: Some(sub.name.as_str()),
                options: Options::new(&sub.options, resolved),
            },
            None => Self { command, subcommand: None, options: Options::new(&data.options, resolved) },
        };
        Ok(invocation)
    }

    pub fn name(&self) -> String {
        match self.subcommand {
            Some(sub) => format!("{} {sub}", self.command),
            None => self.command.to_string(),
        }
    }

    pub fn to_command(&self) -> Result<Command, CommandError> {
        let o = &self.options;
        let command = match (self.command, self.subcommand.unwrap_or_default()) {
            ("trade", "create") => Command::CreateTrade {
                title: o.required_string("title")?,
                price: o.required_integer("price")?,
                stock: o.integer("stock")?,
                image_url: o.attachment_url("image")?,
            },
            ("trade", "done") => {
                let id = o.required_integer("id")?;
                let amount = match o.boolean("all")? {
                    Some(true) => DoneAmount::All,
                    _ => DoneAmount::Units(o.integer("amount")?.unwrap_or(1)),
                };
                Command::TradeDone { id, amount }
            },
            ("trade", "discount") => {
                Command::Discount { id: o.required_integer("id")?, percent: o.integer("percent")? }
            },
            ("trade", "cancel") => Command::CancelTrade { id: o.required_integer("id")?, reason: o.string("reason")? },
            ("trade", "close") => Command::CloseTrade { id: o.required_integer("id")? },
            ("trade", "close_all") => Command::CloseAllTrades,
            ("trade", "done_all") => Command::SellOutAllTrades,
            ("trade", "list") => Command::ListTrades,
            ("buy", "create") => Command::CreateBuyOrder {
                item: o.required_string("item")?,
                price: o.required_integer("price")?,
                amount: o.integer("amount")?,
                attachment_url: o.attachment_url("attachment")?,
            },
            ("buy", "done") => Command::FulfilBuyOrder { id: o.required_integer("id")? },
            ("buy", "cancel") => Command::CancelBuyOrder { id: o.required_integer("id")? },
            ("buy", "fulfill_all") => Command::FulfilAllBuyOrders,
            ("buy", "list") => Command::ListBuyOrders,
            ("tradeconfig", "channel") => {
                Command::SetTradeChannel { channel: o.snowflake("channel")?, kind: o.parsed("type")? }
            },
            ("tradeconfig", "admin_role") => Command::SetAdminRole { role: o.snowflake("role")? },
            ("tradeconfig", "mod_add") => Command::AddModeratorRole { role: o.required_snowflake("role")? },
            ("tradeconfig", "mod_remove") => Command::RemoveModeratorRole { role: o.required_snowflake("role")? },
            ("tradeconfig", "mods") => Command::ListModeratorRoles,
            ("tradeconfig", "tag_add") => {
                Command::AddForumTag { kind: o.required("kind")?, tag: o.required_snowflake("tag")? }
            },
            ("tradeconfig", "tag_remove") => {
                Command::RemoveForumTag { kind: o.required("kind")?, tag: o.required_snowflake("tag")? }
            },
            ("tradeconfig", "tags") => Command::ListForumTags { kind: o.required("kind")? },
            ("trademod", "cancel_trade") => {
                Command::ModCancelTrade { id: o.required_integer("id")?, reason: o.string("reason")? }
            },
            ("trademod", "cancel_buy") => Command::ModCancelBuyOrder { id: o.required_integer("id")? },
            _ => return Err(CommandError::UnknownCommand(self.name())),
        };
        Ok(command)
    }
}
