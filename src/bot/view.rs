//! Rendering of store, trade and error messages into Discord builders.
//!
//! String formatting lives in small pure functions so it can be tested without
//! a Discord connection. The builder functions only assemble those strings.

use super::ids::ComponentId;
use crate::{
    api::{InventoryItem, Stat},
    core::{
        catalogue::GeneratedItem,
        purchase::{PurchaseReceipt, StoreView},
        trade::{OfferDraft, TradeOffer, TradeSettlement},
    },
    errors::{CURRENCY, UserMessage},
};
use poise::serenity_prelude as serenity;
use std::{fmt::Write, time::Duration};

/// `MM:SS`, with minutes allowed past 59.
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Stat list appended to item descriptions: ` | +3 damage | -1 speed`.
#[must_use]
pub fn stat_suffix(stats: &[Stat]) -> String {
    stats.iter().fold(String::new(), |mut out, stat| {
        let sign = if stat.value < 0 { "" } else { "+" };
        let _ = write!(out, " | {sign}{} {}", stat.value, stat.name);
        out
    })
}

/// Field name for a store slot, struck through once sold.
#[must_use]
pub fn slot_heading(index: usize, item: &GeneratedItem, sold: bool) -> String {
    let mut heading = format!(
        "**#{:02} | {} {} {}**",
        index + 1,
        item.rarity.emoji_name,
        item.item_type.emoji_name,
        item.name
    );
    if item.stack_amount > 1 {
        let _ = write!(heading, " **({})**", item.stack_amount);
    }
    if sold {
        heading = format!("~~{heading}~~");
    }
    heading
}

#[must_use]
pub fn slot_body(item: &GeneratedItem) -> String {
    format!(
        "*{}* \n **{CURRENCY}{}**{}",
        item.description,
        item.price,
        stat_suffix(&item.attributes)
    )
}

#[must_use]
pub fn purchase_label(index: usize, price: i64) -> String {
    format!("#{:02} ({CURRENCY}{price})", index + 1)
}

#[must_use]
pub fn store_footer(balance: i64, remaining: Duration) -> String {
    format!(
        "You have {CURRENCY}{balance} | Store will refresh in {}",
        format_countdown(remaining)
    )
}

/// "every hour", "every 2 hours", "every 30 minutes".
#[must_use]
pub fn refresh_phrase(interval: Duration) -> String {
    let secs = interval.as_secs();
    match (secs / 3600, secs % 3600) {
        (1, 0) => "every hour".to_string(),
        (hours, 0) if hours > 1 => format!("every {hours} hours"),
        _ => format!("every {} minutes", (secs / 60).max(1)),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

pub fn store_embed(view: &StoreView, color: u32) -> serenity::CreateEmbed {
    let fields = view
        .catalogue
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            (
                slot_heading(index, &slot.item, slot.is_sold()),
                slot_body(&slot.item),
                false,
            )
        });

    serenity::CreateEmbed::new()
        .title("Today's Store")
        .color(color)
        .fields(fields)
        .footer(serenity::CreateEmbedFooter::new(store_footer(
            view.balance,
            view.catalogue.time_until_refresh(),
        )))
}

/// One purchase button per slot, usable only by `owner`.
pub fn store_components(view: &StoreView, owner: u64) -> Vec<serenity::CreateActionRow> {
    let buttons = view
        .catalogue
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let id = ComponentId::Purchase {
                owner,
                version: view.catalogue.version,
                slot: index,
            };
            serenity::CreateButton::new(id.to_string())
                .label(purchase_label(index, slot.item.price))
                .style(serenity::ButtonStyle::Secondary)
                .disabled(!view.can_buy(slot))
        })
        .collect();

    vec![serenity::CreateActionRow::Buttons(buttons)]
}

pub fn purchase_embed(receipt: &PurchaseReceipt, color: u32) -> serenity::CreateEmbed {
    let item = &receipt.item;
    serenity::CreateEmbed::new()
        .title("Item purchased!")
        .color(color)
        .description(format!(
            "You've purchased {} {} **{}** for **{CURRENCY}{}**.",
            item.rarity.emoji_name, item.item_type.emoji_name, item.name, item.price
        ))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Your new account balance is {CURRENCY}{}",
            receipt.new_balance
        )))
}

/// Item picker shown by `/trade`.
pub fn trade_picker(
    draft: &OfferDraft,
    color: u32,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let embed = serenity::CreateEmbed::new()
        .title("Choose an item")
        .color(color)
        .description(format!(
            "Select an item from your inventory to trade for **{CURRENCY}{}**.",
            draft.price
        ));

    let options = draft
        .items
        .iter()
        .map(|item| {
            serenity::CreateSelectMenuOption::new(
                format!("{} {}", item.item_type.emoji_name, item.name),
                item.id.clone(),
            )
            .description(format!(
                "{} {}",
                capitalize(&item.rarity.name),
                item.item_type.name
            ))
        })
        .collect();

    let id = ComponentId::TradeSelect {
        seller: draft.seller,
        price: draft.price,
    };
    let menu = serenity::CreateSelectMenu::new(
        id.to_string(),
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Choose an item...");

    (embed, vec![serenity::CreateActionRow::SelectMenu(menu)])
}

#[must_use]
pub fn offer_title(seller_name: &str, item: &InventoryItem) -> String {
    format!(
        "@{seller_name} is selling {} {} *{}*",
        item.amount, item.item_type.emoji_name, item.name
    )
}

#[must_use]
pub fn offer_description(offer: &TradeOffer, item: &InventoryItem) -> String {
    let mut description = String::new();
    if let Some(text) = item.description.as_deref().filter(|text| !text.is_empty()) {
        let _ = writeln!(description, "*{text}* ");
    }
    let _ = write!(
        description,
        "{} **{CURRENCY}{}**{}",
        item.rarity.emoji_name,
        offer.price,
        stat_suffix(&item.attributes)
    );
    description
}

/// Open offer with Accept and Retract buttons.
pub fn offer_message(
    offer: &TradeOffer,
    item: &InventoryItem,
    seller_name: &str,
    color: u32,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let embed = serenity::CreateEmbed::new()
        .title(offer_title(seller_name, item))
        .color(color)
        .description(offer_description(offer, item));

    let buttons = vec![
        serenity::CreateButton::new(ComponentId::TradeAccept(offer.clone()).to_string())
            .label(format!("Accept trade ({CURRENCY}{})", offer.price))
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(ComponentId::TradeRetract(offer.clone()).to_string())
            .label("Retract trade (owner only)")
            .style(serenity::ButtonStyle::Secondary),
    ];

    (embed, vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Confirmation posted in the channel and sent to the seller.
pub fn settlement_embed(
    settlement: &TradeSettlement,
    buyer_name: &str,
    seller_name: &str,
    color: u32,
) -> serenity::CreateEmbed {
    let item = &settlement.item;
    serenity::CreateEmbed::new()
        .title(format!(
            "@{buyer_name} purchased {} {} *{}*",
            item.amount, item.item_type.emoji_name, item.name
        ))
        .color(color)
        .description(format!(
            "{} Purchased from **@{seller_name}** for **{CURRENCY}{}**.",
            item.rarity.emoji_name, settlement.offer.price
        ))
}

pub fn error_embed(message: &UserMessage, color: u32) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(message.title.clone())
        .color(color);
    if let Some(description) = &message.description {
        embed = embed.description(description.clone());
    }
    if let Some(status) = message.status {
        embed = embed.footer(serenity::CreateEmbedFooter::new(format!("Error {status}")));
    }
    embed
}

/// `/help store`. `remaining` is `None` while the first catalogue is generating.
pub fn help_store_embed(
    remaining: Option<Duration>,
    interval: Duration,
    color: u32,
) -> serenity::CreateEmbed {
    let footer = remaining.map_or_else(
        || "The store is restocking".to_string(),
        |remaining| format!("Store will refresh in {}", format_countdown(remaining)),
    );

    serenity::CreateEmbed::new()
        .title("💈 About the store • Help")
        .color(color)
        .description("Bruh United is a premium item dealership for the Mingleton RPG.")
        .field(
            "How it works",
            format!(
                "You can use `/store` to browse the catalogue of 5 items. This catalogue will \
                 refresh {}, so be sure to pick up what you want when you see it!",
                refresh_phrase(interval)
            ),
            false,
        )
        .field(
            "What's in the store?",
            "Every catalogue is comprised of **2 weapons**, **1 armour**, **1 food item** and \
             **1 potion/spell**. Every item in each category is roughly equivalent (assuming \
             the same rarity)",
            false,
        )
        .field(
            "How's this different from Baunders & Sons?",
            "Baunders & Sons will feature a far wider selection of items, and each item is far \
             more variable in the stats it may have. Bruh United is designed to sell a smaller, \
             more focused range of generally less-powerful weapons and armour to get the \
             economy started.",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(footer))
}

pub fn changelog_embed(color: u32) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Initial Release • 22w01a")
        .color(color)
        .description(
            "The first official release of Bruh United, fitted a basic store & trading features.",
        )
        .field("Store", "Browse a catalogue of premium items!", false)
        .field(
            "Trading",
            "Put a price on items you own & earn a profit!",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new("Released 08/05/2022"))
}
