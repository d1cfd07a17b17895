//! # Plates
//!
//! Core of a personal cooking assistant: it classifies free-text requests
//! through an external AI provider, keeps a per-user kitchen inventory,
//! recipe library, grocery lists, and chat history, and keeps quantities
//! consistent across inventory, recipe, and grocery operations.
//!
//! The interesting machinery is the inventory reconciliation and
//! quantity-arithmetic engine ([`reconciler`], [`amounts`],
//! [`recipe_inventory`], [`grocery`]); everything else is the glue that
//! feeds it — provider selection ([`ai`]), the key-value persistence
//! boundary ([`storage`]), and the collection services ([`services`]).

pub mod ai;
pub mod amounts;
pub mod assistant;
pub mod categories;
pub mod grocery;
pub mod messages;
pub mod models;
pub mod recipe_inventory;
pub mod recipe_parser;
pub mod reconciler;
pub mod services;
pub mod storage;
pub mod text_processing;
pub mod unit_conversion;
