//! Button and select menu interactions.
//!
//! Every component id is decoded into a [`ComponentId`] first; anything that
//! fails to decode is logged and dropped. Clicks from users a component was not
//! issued for are acknowledged without any visible response.

use crate::{
    bot::{BotData, ids::ComponentId, view},
    core::{
        ensure_actor,
        purchase::{self, PurchaseRequest},
        trade::{self, TradeOffer},
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, info, instrument, warn};

/// Routes a component interaction to its handler.
#[instrument(level = "info", skip(ctx, component, data), fields(user_id = component.user.id.get(), custom_id = %component.data.custom_id))]
pub async fn handle(ctx: &serenity::Context, component: &serenity::ComponentInteraction, data: &BotData) {
    let id = match component.data.custom_id.parse::<ComponentId>() {
        Ok(id) => id,
        Err(e) => {
            warn!("Ignoring component interaction: {e}");
            return;
        }
    };

    let actor = component.user.id.get();
    let result = match id {
        ComponentId::Purchase {
            owner,
            version,
            slot,
        } => {
            let request = PurchaseRequest {
                owner,
                buyer: actor,
                version,
                slot,
            };
            handle_purchase(ctx, component, data, request).await
        }
        ComponentId::TradeSelect { seller, price } => {
            handle_select(ctx, component, data, seller, price).await
        }
        ComponentId::TradeAccept(offer) => handle_accept(ctx, component, data, &offer).await,
        ComponentId::TradeRetract(offer) => handle_retract(ctx, component, data, &offer).await,
    };

    if let Err(e) = result {
        tracing::error!("Failed to respond to component interaction: {e}");
    }
}

async fn handle_purchase(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    request: PurchaseRequest,
) -> Result<()> {
    if ensure_actor(request.owner, request.buyer).is_err() {
        debug!(owner = request.owner, "Ignoring purchase click from another user");
        return acknowledge(ctx, component).await;
    }
    defer_reply(ctx, component).await?;

    let color = data.color();
    match purchase::purchase(data.api.as_ref(), &data.store, &data.wallets, request).await {
        Ok(receipt) => {
            component
                .edit_response(
                    &ctx.http,
                    serenity::EditInteractionResponse::new()
                        .embed(view::purchase_embed(&receipt, color)),
                )
                .await?;

            let mut message = (*component.message).clone();
            message
                .edit(
                    ctx,
                    serenity::EditMessage::new()
                        .embed(view::store_embed(&receipt.view, color))
                        .components(view::store_components(&receipt.view, request.owner)),
                )
                .await?;
            Ok(())
        }
        Err(e) => {
            info!(buyer = request.buyer, slot = request.slot, "Purchase rejected: {e}");
            show_error(ctx, component, &e, color).await
        }
    }
}

async fn handle_select(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    seller: u64,
    price: i64,
) -> Result<()> {
    let actor = component.user.id.get();
    if ensure_actor(seller, actor).is_err() {
        debug!(seller, "Ignoring item selection from another user");
        return acknowledge(ctx, component).await;
    }
    let Some(item_id) = selected_value(component) else {
        warn!("Trade selection carried no value");
        return acknowledge(ctx, component).await;
    };
    acknowledge(ctx, component).await?;

    let color = data.color();
    match trade::select_item(data.api.as_ref(), &data.trades, seller, actor, &item_id, price).await {
        Ok((offer, item)) => {
            let (embed, components) =
                view::offer_message(&offer, &item, &actor_name(component), color);
            component
                .edit_response(
                    &ctx.http,
                    serenity::EditInteractionResponse::new()
                        .embed(embed)
                        .components(components),
                )
                .await?;
            info!(seller, item = %offer.item_id, price, "Trade offer created");
            Ok(())
        }
        Err(e) => {
            info!(seller, "Trade selection rejected: {e}");
            show_error(ctx, component, &e, color).await
        }
    }
}

async fn handle_retract(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    offer: &TradeOffer,
) -> Result<()> {
    match trade::retract(&data.trades, offer, component.user.id.get()) {
        Ok(()) => {
            acknowledge(ctx, component).await?;
            component.message.delete(ctx).await?;
            Ok(())
        }
        Err(e) if e.is_silent() => acknowledge(ctx, component).await,
        Err(e) => reply_ephemeral(ctx, component, &e, data.color()).await,
    }
}

async fn handle_accept(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    offer: &TradeOffer,
) -> Result<()> {
    let buyer = component.user.id.get();
    let color = data.color();
    if offer.seller == buyer {
        return reply_ephemeral(ctx, component, &Error::SelfTrade, color).await;
    }
    defer_reply(ctx, component).await?;

    let settlement = match trade::accept(data.api.as_ref(), &data.trades, &data.wallets, offer, buyer)
        .await
    {
        Ok(settlement) => settlement,
        Err(e) => {
            info!(buyer, item = %offer.item_id, "Trade rejected: {e}");
            return show_error(ctx, component, &e, color).await;
        }
    };

    let seller = serenity::UserId::new(offer.seller);
    let seller_name = match seller.to_user(ctx).await {
        Ok(user) => user.display_name().to_string(),
        Err(e) => {
            warn!(seller = offer.seller, "Failed to look up seller: {e}");
            format!("User {}", offer.seller)
        }
    };
    let embed = view::settlement_embed(&settlement, &actor_name(component), &seller_name, color);

    component
        .edit_response(
            &ctx.http,
            serenity::EditInteractionResponse::new().embed(embed.clone()),
        )
        .await?;

    if let Err(e) = component.message.delete(ctx).await {
        warn!("Failed to delete settled trade offer: {e}");
    }
    if let Err(e) = seller
        .direct_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await
    {
        warn!(seller = offer.seller, "Failed to notify seller: {e}");
    }
    Ok(())
}

/// Deferred update with no visible change.
async fn acknowledge(ctx: &serenity::Context, component: &serenity::ComponentInteraction) -> Result<()> {
    component
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}

/// Deferred new message, filled in later with `edit_response`.
async fn defer_reply(ctx: &serenity::Context, component: &serenity::ComponentInteraction) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new(),
            ),
        )
        .await?;
    Ok(())
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    error: &Error,
    color: u32,
) -> Result<()> {
    let Some(message) = error.user_message() else {
        return acknowledge(ctx, component).await;
    };
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(view::error_embed(&message, color))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Replaces a deferred response with the error, or removes it for silent errors.
async fn show_error(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    error: &Error,
    color: u32,
) -> Result<()> {
    match error.user_message() {
        Some(message) => {
            component
                .edit_response(
                    &ctx.http,
                    serenity::EditInteractionResponse::new()
                        .embed(view::error_embed(&message, color))
                        .components(vec![]),
                )
                .await?;
        }
        None => component.delete_response(&ctx.http).await?,
    }
    Ok(())
}

fn selected_value(component: &serenity::ComponentInteraction) -> Option<String> {
    match &component.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        _ => None,
    }
}

fn actor_name(component: &serenity::ComponentInteraction) -> String {
    component.member.as_ref().map_or_else(
        || component.user.display_name().to_string(),
        |member| member.display_name().to_string(),
    )
}
