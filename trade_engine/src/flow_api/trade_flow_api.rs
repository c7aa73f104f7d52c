use std::fmt::Debug;

use log::*;

use super::{
    errors::{settle, Halt},
    helpers::{authorize, guild_config, owner_name, validate_amount, validate_price, validate_stock, validate_title},
    BulkSummary,
    FlowConfig,
    FlowError,
    InvocationContext,
    Reply,
    SyncWarnings,
    ValidationError,
};
use crate::{
    access::AccessLevel,
    announcements::{post_announcement, sync_announcement, SyncTarget},
    control_id::{ControlAction, ControlId},
    db_types::{AnnouncementUpdate, Auec, ChannelKind, NewTrade, Snowflake, TagKind, Trade, TradeStatus},
    render::{announcement_link, render_trade, trade_status_label},
    traits::{AnnouncementGateway, GuildManagement, TradeManagement, UserManagement},
};

pub const DEFAULT_MODERATOR_REASON: &str = "Cancelled by a moderator";

/// How much stock a "done" action sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneAmount {
    Units(i64),
    /// Whatever is left in stock.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TradeTransition {
    Done(DoneAmount),
    Discount(Option<i64>),
    Cancel(Option<String>),
    Close,
}

/// Who may drive a transition on a given trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    Owner,
    /// Access was checked up front. Ownership is not required.
    Moderator,
}

/// `TradeFlowApi` drives the sell listing lifecycle: creation, partial and full sales, discounts, closing and
/// cancelling, keeping the remote announcement in step with each committed transition.
pub struct TradeFlowApi<B, G> {
    db: B,
    gateway: G,
    config: FlowConfig,
}

impl<B, G> Debug for TradeFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TradeFlowApi (offline: {})", self.config.offline)
    }
}

impl<B, G> TradeFlowApi<B, G> {
    pub fn new(db: B, gateway: G, config: FlowConfig) -> Self {
        Self { db, gateway, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> TradeFlowApi<B, G>
where
    B: TradeManagement + GuildManagement + UserManagement,
    G: AnnouncementGateway,
{
    /// Creates a trade owned by the caller and announces it in the guild's trade channel, if one is configured.
    pub async fn create_trade(
        &self,
        ctx: &InvocationContext,
        title: &str,
        price: i64,
        stock: Option<i64>,
        image_url: Option<String>,
    ) -> Result<Reply, FlowError> {
        settle(self.try_create_trade(ctx, title, price, stock, image_url).await)
    }

    async fn try_create_trade(
        &self,
        ctx: &InvocationContext,
        title: &str,
        price: i64,
        stock: Option<i64>,
        image_url: Option<String>,
    ) -> Result<Reply, Halt> {
        let title = validate_title(title)?;
        let price = validate_price(price)?;
        let stock = validate_stock(stock.unwrap_or(1))?;
        let mut new_trade = NewTrade::new(ctx.guild_id.clone(), ctx.caller.user_id.clone(), title, Auec::from(price))
            .with_stock(stock);
        if let Some(url) = image_url {
            new_trade = new_trade.with_image(url);
        }
        let mut trade = self.db.create_trade(new_trade).await?;
        info!("🔄️ Trade #{} created by {} in guild {}", trade.id, trade.user_id, trade.guild_id);
        let mut reply = Reply::new(format!(
            "Trade #{} created: {} for {}, {} in stock.",
            trade.id,
            trade.title,
            trade.final_price(),
            trade.stock
        ));
        let guild = guild_config(&self.db, &ctx.guild_id).await;
        match guild.as_ref().and_then(|g| g.trade_channel()) {
            None => {
                reply = reply.line("No trade channel is configured, so the trade was saved without an announcement.");
            },
            Some(_) if self.config.offline => {
                reply = reply.line("Offline mode is enabled, so no announcement was posted.");
            },
            Some((channel, kind)) => {
                let tags = self.forum_tags(ctx, kind).await;
                let view = render_trade(&trade, ctx.caller.display(), None);
                match post_announcement(&self.gateway, channel, kind, &view, &tags).await {
                    Ok(posted) => {
                        let update = AnnouncementUpdate::pointer(posted.channel_id.clone(), posted.message_id.clone());
                        match self.db.update_trade_announcement(trade.id, update).await {
                            Ok(Some(t)) => trade = t,
                            Ok(None) => warn!("🔄️ Trade #{} vanished while storing its announcement", trade.id),
                            Err(e) => {
                                warn!("🔄️ Could not store the announcement for trade #{}: {e}", trade.id);
                                reply = reply.line(format!("⚠️ Could not save the announcement location: {e}"));
                            },
                        }
                        let link = announcement_link(
                            &self.config.link_host,
                            &ctx.guild_id,
                            &posted.channel_id,
                            &posted.message_id,
                        );
                        reply = reply.line(format!("Announcement: {link}"));
                    },
                    Err(e) => {
                        warn!("🔄️ Could not announce trade #{}: {e}", trade.id);
                        reply = reply.line(format!("⚠️ Could not post the announcement: {e}"));
                    },
                }
            },
        }
        let controls = render_trade(&trade, ctx.caller.display(), None).controls;
        Ok(reply.with_controls(controls))
    }

    async fn forum_tags(&self, ctx: &InvocationContext, kind: ChannelKind) -> Vec<Snowflake> {
        if kind != ChannelKind::Forum {
            return Vec::new();
        }
        self.db.forum_tags(&ctx.guild_id, TagKind::Sell).await.unwrap_or_else(|e| {
            warn!("🔄️ Could not load the sell tags for guild {}: {e}", ctx.guild_id);
            Vec::new()
        })
    }

    /// Records the sale of `amount` units (or all remaining stock). Selling the last unit marks the trade sold out.
    pub async fn done(&self, ctx: &InvocationContext, id: i64, amount: DoneAmount) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, TradeTransition::Done(amount), Authority::Owner).await)
    }

    /// Sets (`Some`) or clears (`None`) the discount on an open trade.
    pub async fn discount(&self, ctx: &InvocationContext, id: i64, percent: Option<i64>) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, TradeTransition::Discount(percent), Authority::Owner).await)
    }

    pub async fn cancel(&self, ctx: &InvocationContext, id: i64, reason: Option<String>) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, TradeTransition::Cancel(reason), Authority::Owner).await)
    }

    /// Marks the trade complete, whatever stock remains.
    pub async fn close(&self, ctx: &InvocationContext, id: i64) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, TradeTransition::Close, Authority::Owner).await)
    }

    /// Cancels any trade in the guild. Requires moderator access.
    pub async fn admin_cancel_trade(
        &self,
        ctx: &InvocationContext,
        id: i64,
        reason: Option<String>,
    ) -> Result<Reply, FlowError> {
        let result = async {
            authorize(&self.db, ctx, AccessLevel::Moderator).await?;
            let reason = reason.unwrap_or_else(|| DEFAULT_MODERATOR_REASON.to_string());
            info!("🔄️ Moderator {} is cancelling trade #{id}", ctx.caller.user_id);
            self.transition(ctx, id, TradeTransition::Cancel(Some(reason)), Authority::Moderator).await
        };
        settle(result.await)
    }

    /// Closes every open trade the caller owns in this guild.
    pub async fn close_all(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        self.bulk(ctx, TradeTransition::Close, "closed").await
    }

    /// Sells the remaining stock of every open trade the caller owns in this guild.
    pub async fn done_all(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        self.bulk(ctx, TradeTransition::Done(DoneAmount::All), "sold out").await
    }

    pub async fn list(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        let trades = self.db.open_trades_for_user(&ctx.guild_id, &ctx.caller.user_id).await?;
        if trades.is_empty() {
            return Ok(Reply::new("You have no open trades."));
        }
        let lines = trades.iter().map(|t| self.list_line(t)).collect();
        Ok(Reply::new(format!("You have {} open trade(s):", trades.len())).lines(lines))
    }

    fn list_line(&self, trade: &Trade) -> String {
        let link = trade
            .announcement()
            .map(|(c, m)| format!(" {}", announcement_link(&self.config.link_host, &trade.guild_id, c, m)))
            .unwrap_or_default();
        format!("• #{} {}: {}, {} in stock{link}", trade.id, trade.title, trade.final_price(), trade.stock)
    }

    /// Handles a button press on a trade announcement.
    pub async fn press_control(&self, ctx: &InvocationContext, control: &ControlId) -> Result<Reply, FlowError> {
        let id = control.record_id;
        let Some(trade) = self.db.fetch_trade(id).await? else {
            return Ok(Reply::new(format!("Trade #{id} was not found.")));
        };
        if !trade.has_control(&control.to_string()) {
            return Ok(Reply::new("This button is no longer active."));
        }
        let transition = match control.action {
            ControlAction::TradeDoneOne => TradeTransition::Done(DoneAmount::Units(1)),
            ControlAction::TradeDoneAll => TradeTransition::Done(DoneAmount::All),
            ControlAction::TradeCancel => TradeTransition::Cancel(None),
            action => {
                warn!("🔄️ Control {control} with action {action:?} was routed to the trade flow");
                return Ok(Reply::new("This button is not recognised."));
            },
        };
        settle(self.transition(ctx, id, transition, Authority::Owner).await)
    }

    async fn bulk(&self, ctx: &InvocationContext, transition: TradeTransition, verb: &str) -> Result<Reply, FlowError> {
        let trades = self.db.open_trades_for_user(&ctx.guild_id, &ctx.caller.user_id).await?;
        if trades.is_empty() {
            return Ok(Reply::new("You have no open trades."));
        }
        debug!("🔄️ Bulk '{verb}' over {} trades for {}", trades.len(), ctx.caller.user_id);
        let mut summary = BulkSummary::default();
        for trade in trades {
            match self.transition(ctx, trade.id, transition.clone(), Authority::Owner).await {
                Ok(reply) => summary.success(trade.id, "Trade", &reply),
                Err(Halt::Rejected(message)) => summary.failure(trade.id, "Trade", &message),
                Err(Halt::Fatal(e)) => {
                    error!("🔄️ Bulk '{verb}' failed on trade #{}: {e}", trade.id);
                    summary.failure(trade.id, "Trade", "Something went wrong while updating this trade.");
                },
            }
        }
        Ok(summary.into_reply(verb, "trade(s)"))
    }

    async fn transition(
        &self,
        ctx: &InvocationContext,
        id: i64,
        transition: TradeTransition,
        authority: Authority,
    ) -> Result<Reply, Halt> {
        let trade = self.db.fetch_trade(id).await?.ok_or_else(|| Halt::rejected(format!("Trade #{id} was not found.")))?;
        if trade.guild_id != ctx.guild_id {
            return Err(Halt::rejected(format!("Trade #{id} belongs to another server.")));
        }
        if authority == Authority::Owner && trade.user_id != ctx.caller.user_id {
            return Err(Halt::rejected(format!("Trade #{id} is not yours.")));
        }
        if trade.status != TradeStatus::Open {
            let label = trade_status_label(trade.status).to_lowercase();
            return Err(Halt::rejected(format!("Trade #{id} is {label} and can no longer be changed.")));
        }
        let updated = match &transition {
            TradeTransition::Done(amount) => {
                let units = match amount {
                    DoneAmount::Units(n) => validate_amount(*n)?,
                    DoneAmount::All => trade.stock,
                };
                if units > trade.stock {
                    return Err(Halt::rejected(format!("Trade #{id} only has {} in stock.", trade.stock)));
                }
                self.db.reduce_stock(id, units).await?
            },
            TradeTransition::Discount(percent) => {
                if let Some(p) = (*percent).filter(|p| !(0..=95).contains(p)) {
                    return Err(ValidationError::InvalidDiscount(p).into());
                }
                self.db.update_discount(id, *percent).await?
            },
            TradeTransition::Cancel(reason) => self.db.update_status(id, TradeStatus::Cancelled, reason.clone()).await?,
            TradeTransition::Close => self.db.update_status(id, TradeStatus::Complete, None).await?,
        };
        let Some(mut trade) = updated else {
            debug!("🔄️ Guarded update on trade #{id} was rejected ({transition:?})");
            return Err(Halt::rejected(format!(
                "Unable to apply that change to trade #{id}. It may have been updated in the meantime."
            )));
        };
        debug!("🔄️ Trade #{id} is now {} with {} in stock", trade.status, trade.stock);
        let mut warnings = SyncWarnings::default();
        if trade.status != TradeStatus::Open && trade.has_controls() {
            match self.db.update_trade_announcement(id, AnnouncementUpdate::clear_controls()).await {
                Ok(Some(t)) => trade = t,
                Ok(None) => warnings.metadata = Some(format!("trade #{id} no longer exists")),
                Err(e) => {
                    warn!("🔄️ Could not clear the controls of trade #{id}: {e}");
                    warnings.metadata = Some(e.to_string());
                },
            }
        }
        let confirmation = confirmation(&trade, &transition, authority);
        let closed = trade.status.is_terminal();
        let guild = match (closed, trade.announcement()) {
            (true, Some(_)) => guild_config(&self.db, &ctx.guild_id).await,
            _ => None,
        };
        let view = render_trade(&trade, &owner_name(&self.db, &trade.user_id).await, None);
        let target = SyncTarget { guild_id: &ctx.guild_id, guild: guild.as_ref(), pointer: trade.announcement(), closed };
        let pointer_line = sync_announcement(&self.gateway, &self.config, target, &view, &mut warnings).await;
        Ok(Reply::new(confirmation).line(pointer_line).lines(warnings.into_lines()).with_controls(view.controls))
    }
}

fn confirmation(trade: &Trade, transition: &TradeTransition, authority: Authority) -> String {
    let id = trade.id;
    match transition {
        TradeTransition::Done(_) if trade.status == TradeStatus::SoldOut => format!("Trade #{id} is now sold out."),
        TradeTransition::Done(_) => format!("Sale recorded for trade #{id}. {} left in stock.", trade.stock),
        TradeTransition::Discount(Some(p)) => format!("Trade #{id} is now {p}% off at {}.", trade.final_price()),
        TradeTransition::Discount(None) => format!("Removed the discount from trade #{id}."),
        TradeTransition::Cancel(reason) => {
            let by = if authority == Authority::Moderator { " by a moderator" } else { "" };
            let reason = reason.as_ref().map(|r| format!(" Reason: {r}")).unwrap_or_default();
            format!("Trade #{id} cancelled{by}.{reason}")
        },
        TradeTransition::Close => format!("Trade #{id} closed."),
    }
}
