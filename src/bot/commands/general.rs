//! General Discord commands - help and changelog.
//! These commands only read local state and never call the economy service.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, view},
        errors::{Error, Result},
    };

    /// Get help on a particular subject
    #[poise::command(slash_command, subcommands("help_store"), subcommand_required)]
    pub async fn help(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Find out how the Bruh United store works
    #[poise::command(slash_command, rename = "store")]
    pub async fn help_store(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let remaining = data
            .store
            .snapshot()
            .await
            .ok()
            .map(|catalogue| catalogue.time_until_refresh());

        let embed = view::help_store_embed(
            remaining,
            data.settings.store.refresh_interval(),
            data.color(),
        );
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// See what's changed recently
    #[poise::command(slash_command)]
    pub async fn changelog(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.send(poise::CreateReply::default().embed(view::changelog_embed(ctx.data().color())))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
