//! Cart and order engine for the storefront.
//!
//! This crate owns everything with real invariants in the shop:
//! - [`Cart`] aggregate with its line items and derived totals
//! - [`recount`], the only writer of a cart's `final_price` / `final_quantity`
//! - [`Shopper`] aggregate enforcing one open cart per user
//! - [`Order`] aggregate, an immutable snapshot of a checked-out cart
//! - [`CheckoutService`], the contract consumed by the presentation tier
//!
//! Catalog, authentication and persistence are collaborators reached through
//! [`ProductCatalog`], [`Identity`] and [`event_store::EventStore`].

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod money;
pub mod order;
pub mod service;
pub mod shopper;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{Cart, CartError, CartEvent, CartState, CartTotals, LineItem, LineItemId, recount};
pub use catalog::{CatalogError, InMemoryCatalog, Product, ProductCatalog, ProductId};
pub use command::{CommandHandler, CommandResult};
pub use commands::{AddItem, ChangeQuantity, PlaceOrder, RemoveItem};
pub use common::{AggregateId, UserId};
pub use config::CheckoutConfig;
pub use error::{CheckoutError, FieldError, Result, ValidationErrors};
pub use identity::Identity;
pub use money::Money;
pub use order::{BuyingType, Order, OrderDetails, OrderError, OrderEvent, OrderForm};
pub use service::CheckoutService;
pub use shopper::{Shopper, ShopperError, ShopperEvent};
