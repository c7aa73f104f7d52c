use std::fmt::Debug;

use discord_tools::data_objects::{
    AllowedMentions,
    Interaction,
    InteractionResponse,
    MessagePayload,
    FLAG_EPHEMERAL,
    INTERACTION_APPLICATION_COMMAND,
    INTERACTION_MESSAGE_COMPONENT,
    INTERACTION_PING,
};
use log::*;
use serde_json::json;
use trade_engine::{
    db_types::Snowflake,
    dispatch_control,
    generic_failure,
    guild_cache::GuildMetadataCache,
    AnnouncementGateway,
    BuyOrderFlowApi,
    Caller,
    FlowConfig,
    FlowError,
    GuildConfigApi,
    GuildDirectory,
    IdentityApi,
    InvocationContext,
    Reply,
    TradeDeskDatabase,
    TradeFlowApi,
};

use super::{Command, Invocation};
use crate::{errors::ServerError, integrations::discord::action_rows};

const GUILD_ONLY: &str = "The trade desk only works inside a server.";

/// All the flows a command can reach, sharing one database handle and one gateway.
pub struct TradeDesk<B, G, D> {
    trades: TradeFlowApi<B, G>,
    buy_orders: BuyOrderFlowApi<B, G>,
    guild_config: GuildConfigApi<B>,
    identity: IdentityApi<B, D>,
}

impl<B, G, D> Debug for TradeDesk<B, G, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TradeDesk ({:?}, {:?})", self.trades, self.identity)
    }
}

impl<B, G, D> TradeDesk<B, G, D>
where
    B: TradeDeskDatabase,
    G: Clone,
{
    pub fn new(db: B, gateway: G, guilds: GuildMetadataCache<D>, config: FlowConfig) -> Self {
        Self {
            trades: TradeFlowApi::new(db.clone(), gateway.clone(), config.clone()),
            buy_orders: BuyOrderFlowApi::new(db.clone(), gateway, config),
            guild_config: GuildConfigApi::new(db.clone()),
            identity: IdentityApi::new(db, guilds),
        }
    }
}

impl<B, G, D> TradeDesk<B, G, D>
where
    B: TradeDeskDatabase,
    G: AnnouncementGateway,
    D: GuildDirectory,
{
    /// Answers a verified interaction. Only unsupported interaction types are errors; everything else, including
    /// failed commands, becomes a reply.
    pub async fn handle(&self, interaction: Interaction) -> Result<InteractionResponse, ServerError> {
        match interaction.kind {
            INTERACTION_PING => {
                debug!("💻️ Received PING {}", interaction.id);
                Ok(InteractionResponse::pong())
            },
            INTERACTION_APPLICATION_COMMAND | INTERACTION_MESSAGE_COMPONENT => {
                let reply = self.respond(&interaction).await;
                Ok(reply_response(reply))
            },
            kind => {
                warn!("💻️ Interaction {} has unsupported type {kind}", interaction.id);
                Err(ServerError::UnsupportedInteraction(kind))
            },
        }
    }

    async fn respond(&self, interaction: &Interaction) -> Reply {
        let Some(caller) = caller_from_interaction(interaction) else {
            warn!("💻️ Interaction {} has no caller", interaction.id);
            return Reply::new(GUILD_ONLY);
        };
        let guild = interaction.guild_id.clone().map(Snowflake::from);
        let Some(data) = interaction.data.as_ref() else {
            return Reply::new("That interaction carried no data.");
        };
        let outcome = if interaction.kind == INTERACTION_MESSAGE_COMPONENT {
            let custom_id = data.custom_id.clone().unwrap_or_default();
            self.identity.record_invocation(guild.as_ref(), &caller, "button", json!({ "custom_id": custom_id })).await;
            let Some(guild_id) = guild else {
                return Reply::new(GUILD_ONLY);
            };
            let ctx = InvocationContext::new(guild_id, caller);
            dispatch_control(&self.trades, &self.buy_orders, &ctx, &custom_id).await
        } else {
            let invocation = match Invocation::from_data(data) {
                Ok(i) => i,
                Err(e) => return Reply::new(e.to_string()),
            };
            let name = invocation.name();
            self.identity.record_invocation(guild.as_ref(), &caller, &name, invocation.options.to_json()).await;
            let Some(guild_id) = guild else {
                return Reply::new(GUILD_ONLY);
            };
            let command = match invocation.to_command() {
                Ok(c) => c,
                Err(e) => {
                    debug!("💻️ Could not parse /{name}: {e}");
                    return Reply::new(e.to_string());
                },
            };
            info!("💻️ {} ran /{name} in guild {guild_id}", caller.user_id);
            let ctx = InvocationContext::new(guild_id, caller);
            self.run(&ctx, command).await
        };
        outcome.unwrap_or_else(|e| generic_failure(&e))
    }

    pub async fn run(&self, ctx: &InvocationContext, command: Command) -> Result<Reply, FlowError> {
        match command {
            Command::CreateTrade { title, price, stock, image_url } => {
                self.trades.create_trade(ctx, &title, price, stock, image_url).await
            },
            Command::TradeDone { id, amount } => self.trades.done(ctx, id, amount).await,
            Command::Discount { id, percent } => self.trades.discount(ctx, id, percent).await,
            Command::CancelTrade { id, reason } => self.trades.cancel(ctx, id, reason).await,
            Command::CloseTrade { id } => self.trades.close(ctx, id).await,
            Command::CloseAllTrades => self.trades.close_all(ctx).await,
            Command::SellOutAllTrades => self.trades.done_all(ctx).await,
            Command::ListTrades => self.trades.list(ctx).await,
            Command::CreateBuyOrder { item, price, amount, attachment_url } => {
                self.buy_orders.create_buy_order(ctx, &item, price, amount, attachment_url).await
            },
            Command::FulfilBuyOrder { id } => self.buy_orders.done(ctx, id).await,
            Command::CancelBuyOrder { id } => self.buy_orders.cancel(ctx, id).await,
            Command::FulfilAllBuyOrders => self.buy_orders.fulfill_all(ctx).await,
            Command::ListBuyOrders => self.buy_orders.list(ctx).await,
            Command::SetTradeChannel { channel, kind } => self.guild_config.set_channel(ctx, channel, kind).await,
            Command::SetAdminRole { role } => self.guild_config.set_admin_role(ctx, role).await,
            Command::AddModeratorRole { role } => self.guild_config.add_moderator_role(ctx, &role).await,
            Command::RemoveModeratorRole { role } => self.guild_config.remove_moderator_role(ctx, &role).await,
            Command::ListModeratorRoles => self.guild_config.moderator_roles(ctx).await,
            Command::AddForumTag { kind, tag } => self.guild_config.add_forum_tag(ctx, kind, &tag).await,
            Command::RemoveForumTag { kind, tag } => self.guild_config.remove_forum_tag(ctx, kind, &tag).await,
            Command::ListForumTags { kind } => self.guild_config.forum_tags(ctx, kind).await,
            Command::ModCancelTrade { id, reason } => self.trades.admin_cancel_trade(ctx, id, reason).await,
            Command::ModCancelBuyOrder { id } => self.buy_orders.admin_cancel_buy(ctx, id).await,
        }
    }
}

/// Resolves who is invoking the interaction. In a guild, the member's nickname wins over the global display name.
pub fn caller_from_interaction(interaction: &Interaction) -> Option<Caller> {
    let user = interaction.caller()?;
    let member = interaction.member.as_ref();
    let permissions = member.and_then(|m| m.permissions.as_deref()).map(|p| {
        p.parse::<u64>().unwrap_or_else(|e| {
            warn!("💻️ Could not parse the permission set '{p}' of {}. {e}", user.id);
            0
        })
    });
    let roles = member.map(|m| m.roles.iter().cloned().map(Snowflake::from).collect()).unwrap_or_default();
    let display_name = member.and_then(|m| m.nick.clone()).or_else(|| user.global_name.clone());
    let mut caller = Caller::new(Snowflake::from(user.id.clone()), user.username.clone())
        .with_roles(roles)
        .with_permissions(permissions.unwrap_or_default());
    caller.display_name = display_name;
    caller.discriminator = user.discriminator.clone().filter(|d| d != "0");
    Some(caller)
}

/// Replies are only shown to the caller, and never ping anyone.
pub fn reply_response(reply: Reply) -> InteractionResponse {
    InteractionResponse::message(MessagePayload {
        content: Some(reply.text()),
        embeds: Vec::new(),
        components: action_rows(&reply.controls),
        allowed_mentions: Some(AllowedMentions::default()),
        flags: Some(FLAG_EPHEMERAL),
    })
}
