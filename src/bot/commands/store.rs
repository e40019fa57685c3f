//! Store command - shows the current catalogue with purchase buttons.
//!
//! Purchases themselves arrive as button clicks and are handled in
//! [`crate::bot::handlers::components`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, view},
        core::purchase,
        errors::{Error, Result},
    };

    /// Open the Bruh United store
    ///
    /// Shows the five items on sale. Buttons for items the caller cannot
    /// afford, or that are already sold, are disabled.
    #[poise::command(slash_command)]
    pub async fn store(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;

        let data = ctx.data();
        let user_id = ctx.author().id.get();
        let store_view = purchase::view_store(data.api.as_ref(), &data.store, user_id).await?;

        let color = data.color();
        ctx.send(
            poise::CreateReply::default()
                .embed(view::store_embed(&store_view, color))
                .components(view::store_components(&store_view, user_id)),
        )
        .await?;
        Ok(())
    }
}

pub use inner::*;
