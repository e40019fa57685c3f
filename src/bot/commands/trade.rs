//! Trade command - starts a player-to-player trade.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, view},
        core::trade::open_offer,
        errors::{Error, Result},
    };
    use tracing::info;

    /// Trade your items with other players
    ///
    /// Lists the caller's inventory in a select menu. Picking an item turns the
    /// message into an offer anyone else can accept.
    #[poise::command(slash_command)]
    pub async fn trade(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "The price of your item"] price: Option<i64>,
    ) -> Result<()> {
        ctx.defer().await?;

        let data = ctx.data();
        let seller = ctx.author().id.get();
        let draft = open_offer(data.api.as_ref(), seller, price).await?;
        info!(seller, price = draft.price, items = draft.items.len(), "Trade started");

        let (embed, components) = view::trade_picker(&draft, data.color());
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components),
        )
        .await?;
        Ok(())
    }
}

pub use inner::*;
