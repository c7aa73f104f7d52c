use log::*;

use super::{BuyOrderFlowApi, FlowError, InvocationContext, Reply, TradeFlowApi};
use crate::{
    control_id::ControlId,
    traits::{AnnouncementGateway, BuyOrderManagement, GuildManagement, TradeManagement, UserManagement},
};

/// Routes a button press to the flow that owns the record it refers to.
///
/// Malformed ids are answered with the parse error, never raised.
pub async fn dispatch_control<B, G>(
    trades: &TradeFlowApi<B, G>,
    buy_orders: &BuyOrderFlowApi<B, G>,
    ctx: &InvocationContext,
    custom_id: &str,
) -> Result<Reply, FlowError>
where
    B: TradeManagement + BuyOrderManagement + GuildManagement + UserManagement,
    G: AnnouncementGateway,
{
    let control = match custom_id.parse::<ControlId>() {
        Ok(control) => control,
        Err(e) => {
            debug!("🔄️ Ignoring button press: {e}");
            return Ok(Reply::new(format!("This button is not recognised. {e}")));
        },
    };
    trace!("🔄️ {} pressed {control}", ctx.caller.user_id);
    if control.action.is_trade() {
        trades.press_control(ctx, &control).await
    } else {
        buy_orders.press_control(ctx, &control).await
    }
}
