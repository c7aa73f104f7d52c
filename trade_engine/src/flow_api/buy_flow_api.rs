use std::fmt::Debug;

use log::*;

use super::{
    errors::{settle, Halt},
    helpers::{authorize, guild_config, owner_name, validate_amount, validate_price, validate_title},
    BulkSummary,
    FlowConfig,
    FlowError,
    InvocationContext,
    Reply,
    SyncWarnings,
};
use crate::{
    access::AccessLevel,
    announcements::{post_announcement, sync_announcement, SyncTarget},
    control_id::{ControlAction, ControlId},
    db_types::{AnnouncementUpdate, Auec, BuyOrder, BuyOrderStatus, ChannelKind, NewBuyOrder, Snowflake, TagKind},
    render::{announcement_link, buy_order_status_label, render_buy_order},
    traits::{AnnouncementGateway, BuyOrderManagement, GuildManagement, UserManagement},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    Owner,
    Moderator,
}

/// `BuyOrderFlowApi` drives the buy order lifecycle. Buy orders have no stock: they are either fulfilled or
/// cancelled in one step.
pub struct BuyOrderFlowApi<B, G> {
    db: B,
    gateway: G,
    config: FlowConfig,
}

impl<B, G> Debug for BuyOrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuyOrderFlowApi (offline: {})", self.config.offline)
    }
}

impl<B, G> BuyOrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, config: FlowConfig) -> Self {
        Self { db, gateway, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> BuyOrderFlowApi<B, G>
where
    B: BuyOrderManagement + GuildManagement + UserManagement,
    G: AnnouncementGateway,
{
    pub async fn create_buy_order(
        &self,
        ctx: &InvocationContext,
        item: &str,
        price: i64,
        amount: Option<i64>,
        attachment_url: Option<String>,
    ) -> Result<Reply, FlowError> {
        settle(self.try_create_buy_order(ctx, item, price, amount, attachment_url).await)
    }

    async fn try_create_buy_order(
        &self,
        ctx: &InvocationContext,
        item: &str,
        price: i64,
        amount: Option<i64>,
        attachment_url: Option<String>,
    ) -> Result<Reply, Halt> {
        let item = validate_title(item)?;
        let price = validate_price(price)?;
        let mut new_order = NewBuyOrder::new(ctx.guild_id.clone(), ctx.caller.user_id.clone(), item, Auec::from(price));
        if let Some(amount) = amount {
            new_order = new_order.with_amount(validate_amount(amount)?);
        }
        if let Some(url) = attachment_url {
            new_order = new_order.with_attachment(url);
        }
        let mut order = self.db.create_buy_order(new_order).await?;
        info!("🔄️ Buy order #{} created by {} in guild {}", order.id, order.user_id, order.guild_id);
        let amount = order.amount.map(|a| format!(", {a} unit(s)")).unwrap_or_default();
        let mut reply =
            Reply::new(format!("Buy order #{} created: {} for {}{amount}.", order.id, order.item, order.price));
        let guild = guild_config(&self.db, &ctx.guild_id).await;
        match guild.as_ref().and_then(|g| g.trade_channel()) {
            None => {
                reply =
                    reply.line("No trade channel is configured, so the buy order was saved without an announcement.");
            },
            Some(_) if self.config.offline => {
                reply = reply.line("Offline mode is enabled, so no announcement was posted.");
            },
            Some((channel, kind)) => {
                let tags = self.forum_tags(ctx, kind).await;
                let view = render_buy_order(&order, ctx.caller.display(), None);
                match post_announcement(&self.gateway, channel, kind, &view, &tags).await {
                    Ok(posted) => {
                        let update = AnnouncementUpdate::pointer(posted.channel_id.clone(), posted.message_id.clone());
                        match self.db.update_buy_order_announcement(order.id, update).await {
                            Ok(Some(o)) => order = o,
                            Ok(None) => warn!("🔄️ Buy order #{} vanished while storing its announcement", order.id),
                            Err(e) => {
                                warn!("🔄️ Could not store the announcement for buy order #{}: {e}", order.id);
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
                        warn!("🔄️ Could not announce buy order #{}: {e}", order.id);
                        reply = reply.line(format!("⚠️ Could not post the announcement: {e}"));
                    },
                }
            },
        }
        let controls = render_buy_order(&order, ctx.caller.display(), None).controls;
        Ok(reply.with_controls(controls))
    }

    async fn forum_tags(&self, ctx: &InvocationContext, kind: ChannelKind) -> Vec<Snowflake> {
        if kind != ChannelKind::Forum {
            return Vec::new();
        }
        self.db.forum_tags(&ctx.guild_id, TagKind::Buy).await.unwrap_or_else(|e| {
            warn!("🔄️ Could not load the buy tags for guild {}: {e}", ctx.guild_id);
            Vec::new()
        })
    }

    /// Marks the buy order as fulfilled.
    pub async fn done(&self, ctx: &InvocationContext, id: i64) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, BuyOrderStatus::Fulfilled, Authority::Owner).await)
    }

    pub async fn cancel(&self, ctx: &InvocationContext, id: i64) -> Result<Reply, FlowError> {
        settle(self.transition(ctx, id, BuyOrderStatus::Cancelled, Authority::Owner).await)
    }

    /// Cancels any buy order in the guild. Requires moderator access.
    pub async fn admin_cancel_buy(&self, ctx: &InvocationContext, id: i64) -> Result<Reply, FlowError> {
        let result = async {
            authorize(&self.db, ctx, AccessLevel::Moderator).await?;
            info!("🔄️ Moderator {} is cancelling buy order #{id}", ctx.caller.user_id);
            self.transition(ctx, id, BuyOrderStatus::Cancelled, Authority::Moderator).await
        };
        settle(result.await)
    }

    /// Fulfils every open buy order the caller owns in this guild.
    pub async fn fulfill_all(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        let orders = self.db.open_buy_orders_for_user(&ctx.guild_id, &ctx.caller.user_id).await?;
        if orders.is_empty() {
            return Ok(Reply::new("You have no open buy orders."));
        }
        let mut summary = BulkSummary::default();
        for order in orders {
            match self.transition(ctx, order.id, BuyOrderStatus::Fulfilled, Authority::Owner).await {
                Ok(reply) => summary.success(order.id, "Buy order", &reply),
                Err(Halt::Rejected(message)) => summary.failure(order.id, "Buy order", &message),
                Err(Halt::Fatal(e)) => {
                    error!("🔄️ Bulk fulfil failed on buy order #{}: {e}", order.id);
                    summary.failure(order.id, "Buy order", "Something went wrong while updating this buy order.");
                },
            }
        }
        Ok(summary.into_reply("fulfilled", "buy order(s)"))
    }

    pub async fn list(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        let orders = self.db.open_buy_orders_for_user(&ctx.guild_id, &ctx.caller.user_id).await?;
        if orders.is_empty() {
            return Ok(Reply::new("You have no open buy orders."));
        }
        let lines = orders.iter().map(|o| self.list_line(o)).collect();
        Ok(Reply::new(format!("You have {} open buy order(s):", orders.len())).lines(lines))
    }

    fn list_line(&self, order: &BuyOrder) -> String {
        let amount = order.amount.map(|a| format!(", {a} unit(s)")).unwrap_or_default();
        let link = order
            .announcement()
            .map(|(c, m)| format!(" {}", announcement_link(&self.config.link_host, &order.guild_id, c, m)))
            .unwrap_or_default();
        format!("• #{} {}: {}{amount}{link}", order.id, order.item, order.price)
    }

    /// Handles a button press on a buy order announcement.
    pub async fn press_control(&self, ctx: &InvocationContext, control: &ControlId) -> Result<Reply, FlowError> {
        let id = control.record_id;
        let Some(order) = self.db.fetch_buy_order(id).await? else {
            return Ok(Reply::new(format!("Buy order #{id} was not found.")));
        };
        if !order.has_control(&control.to_string()) {
            return Ok(Reply::new("This button is no longer active."));
        }
        let status = match control.action {
            ControlAction::BuyDone => BuyOrderStatus::Fulfilled,
            ControlAction::BuyCancel => BuyOrderStatus::Cancelled,
            action => {
                warn!("🔄️ Control {control} with action {action:?} was routed to the buy order flow");
                return Ok(Reply::new("This button is not recognised."));
            },
        };
        settle(self.transition(ctx, id, status, Authority::Owner).await)
    }

    async fn transition(
        &self,
        ctx: &InvocationContext,
        id: i64,
        status: BuyOrderStatus,
        authority: Authority,
    ) -> Result<Reply, Halt> {
        let order =
            self.db.fetch_buy_order(id).await?.ok_or_else(|| Halt::rejected(format!("Buy order #{id} was not found.")))?;
        if order.guild_id != ctx.guild_id {
            return Err(Halt::rejected(format!("Buy order #{id} belongs to another server.")));
        }
        if authority == Authority::Owner && order.user_id != ctx.caller.user_id {
            return Err(Halt::rejected(format!("Buy order #{id} is not yours.")));
        }
        if order.status != BuyOrderStatus::Open {
            let label = buy_order_status_label(order.status).to_lowercase();
            return Err(Halt::rejected(format!("Buy order #{id} is already {label}.")));
        }
        let Some(mut order) = self.db.update_buy_order_status(id, status).await? else {
            debug!("🔄️ Guarded update on buy order #{id} to {status} was rejected");
            return Err(Halt::rejected(format!(
                "Unable to apply that change to buy order #{id}. It may have been updated in the meantime."
            )));
        };
        debug!("🔄️ Buy order #{id} is now {}", order.status);
        let mut warnings = SyncWarnings::default();
        if order.has_controls() {
            match self.db.update_buy_order_announcement(id, AnnouncementUpdate::clear_controls()).await {
                Ok(Some(o)) => order = o,
                Ok(None) => warnings.metadata = Some(format!("buy order #{id} no longer exists")),
                Err(e) => {
                    warn!("🔄️ Could not clear the controls of buy order #{id}: {e}");
                    warnings.metadata = Some(e.to_string());
                },
            }
        }
        let confirmation = match (status, authority) {
            (BuyOrderStatus::Fulfilled, _) => format!("Buy order #{id} marked as fulfilled."),
            (_, Authority::Moderator) => format!("Buy order #{id} cancelled by a moderator."),
            _ => format!("Buy order #{id} cancelled."),
        };
        let guild = match order.announcement() {
            Some(_) => guild_config(&self.db, &ctx.guild_id).await,
            None => None,
        };
        let view = render_buy_order(&order, &owner_name(&self.db, &order.user_id).await, None);
        let target =
            SyncTarget { guild_id: &ctx.guild_id, guild: guild.as_ref(), pointer: order.announcement(), closed: true };
        let pointer_line = sync_announcement(&self.gateway, &self.config, target, &view, &mut warnings).await;
        Ok(Reply::new(confirmation).line(pointer_line).lines(warnings.into_lines()))
    }
}
