//! Typed custom ids for message components.
//!
//! Every button and select menu carries all the state its handler needs, so no
//! offer or store session is kept server-side. Ids are `:`-joined segments;
//! the free-form item id always comes last.

use crate::{
    core::trade::TradeOffer,
    errors::{Error, Result},
};
use std::{fmt, str::FromStr};

const STORE_BUY: &str = "store:buy";
const TRADE_SELECT: &str = "trade:select";
const TRADE_ACCEPT: &str = "trade:accept";
const TRADE_RETRACT: &str = "trade:retract";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentId {
    /// Purchase button on a store message opened by `owner`.
    Purchase { owner: u64, version: u64, slot: usize },
    /// Item picker shown by `/trade`.
    TradeSelect { seller: u64, price: i64 },
    TradeAccept(TradeOffer),
    TradeRetract(TradeOffer),
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase {
                owner,
                version,
                slot,
            } => write!(f, "{STORE_BUY}:{owner}:{version}:{slot}"),
            Self::TradeSelect { seller, price } => write!(f, "{TRADE_SELECT}:{seller}:{price}"),
            Self::TradeAccept(offer) => write_offer(f, TRADE_ACCEPT, offer),
            Self::TradeRetract(offer) => write_offer(f, TRADE_RETRACT, offer),
        }
    }
}

fn write_offer(f: &mut fmt::Formatter<'_>, prefix: &str, offer: &TradeOffer) -> fmt::Result {
    write!(f, "{prefix}:{}:{}:{}", offer.seller, offer.price, offer.item_id)
}

impl FromStr for ComponentId {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let decoded = if let Some(rest) = payload(token, STORE_BUY) {
            fields(rest, 3).and_then(|f| {
                Some(Self::Purchase {
                    owner: f[0].parse().ok()?,
                    version: f[1].parse().ok()?,
                    slot: f[2].parse().ok()?,
                })
            })
        } else if let Some(rest) = payload(token, TRADE_SELECT) {
            fields(rest, 2).and_then(|f| {
                Some(Self::TradeSelect {
                    seller: f[0].parse().ok()?,
                    price: f[1].parse().ok()?,
                })
            })
        } else if let Some(rest) = payload(token, TRADE_ACCEPT) {
            decode_offer(rest).map(Self::TradeAccept)
        } else if let Some(rest) = payload(token, TRADE_RETRACT) {
            decode_offer(rest).map(Self::TradeRetract)
        } else {
            None
        };

        decoded.ok_or_else(|| Error::InvalidToken {
            token: token.to_string(),
        })
    }
}

fn payload<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    token.strip_prefix(prefix)?.strip_prefix(':')
}

/// Splits into exactly `count` non-empty fields; the last one keeps any further `:`.
fn fields(rest: &str, count: usize) -> Option<Vec<&str>> {
    let parts: Vec<&str> = rest.splitn(count, ':').collect();
    (parts.len() == count && parts.iter().all(|part| !part.is_empty())).then_some(parts)
}

fn decode_offer(rest: &str) -> Option<TradeOffer> {
    let f = fields(rest, 3)?;
    Some(TradeOffer {
        seller: f[0].parse().ok()?,
        price: f[1].parse().ok()?,
        item_id: f[2].to_string(),
    })
}
