//! Checkout service: the contract the presentation tier calls.

use std::future::Future;

use chrono::Utc;
use common::{AggregateId, UserId};
use event_store::{EventStore, Version};

use crate::aggregate::Aggregate;
use crate::cart::{Cart, validate_quantity};
use crate::catalog::ProductCatalog;
use crate::command::{CommandHandler, record_retry};
use crate::commands::{AddItem, ChangeQuantity, PlaceOrder, RemoveItem};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::identity::Identity;
use crate::order::{Order, OrderDetails, OrderPlacedData};
use crate::shopper::{Shopper, shopper_id};

/// Service for carts and orders.
///
/// Stateless between calls: every operation rebuilds the aggregates it needs
/// from the event store and commits with optimistic concurrency. Commits
/// that span several streams (opening a cart, placing an order) go through
/// [`EventStore::append_batch`] so they land entirely or not at all.
pub struct CheckoutService<S, C>
where
    S: EventStore + Clone,
    C: ProductCatalog,
{
    store: S,
    catalog: C,
    carts: CommandHandler<S, Cart>,
    shoppers: CommandHandler<S, Shopper>,
    orders: CommandHandler<S, Order>,
    config: CheckoutConfig,
}

impl<S, C> CheckoutService<S, C>
where
    S: EventStore + Clone,
    C: ProductCatalog,
{
    /// Creates a service with the default configuration.
    pub fn new(store: S, catalog: C) -> Self {
        Self::with_config(store, catalog, CheckoutConfig::default())
    }

    pub fn with_config(store: S, catalog: C, config: CheckoutConfig) -> Self {
        let retries = config.max_conflict_retries;
        Self {
            carts: CommandHandler::new(store.clone(), retries),
            shoppers: CommandHandler::new(store.clone(), retries),
            orders: CommandHandler::new(store.clone(), retries),
            store,
            catalog,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn config(&self) -> CheckoutConfig {
        self.config
    }

    /// Returns the caller's open cart, opening one if needed.
    ///
    /// Anonymous callers get a transient cart that is never stored.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_cart(&self, identity: Identity) -> Result<Cart> {
        let Some(user) = identity.user() else {
            return Ok(Cart::anonymous());
        };

        self.with_retries(Shopper::aggregate_type(), shopper_id(user), || {
            self.try_resolve_cart(user)
        })
        .await
    }

    /// Adds one unit of a product to a cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, cmd: AddItem) -> Result<Cart> {
        let user = cmd.identity.require_user()?;
        let cart_id = cmd.cart_id;

        self.carts
            .load(cart_id)
            .await?
            .check_mutable(cart_id, user, "add item")?;
        let product = self.catalog.get_product(&cmd.product_id).await?;
        product.check_price()?;

        let result = self
            .carts
            .execute(cart_id, Some(user), |cart| {
                cart.check_mutable(cart_id, user, "add item")?;
                cart.add_product(&product, user)
            })
            .await?;

        metrics::counter!("cart_items_added_total").increment(1);
        tracing::debug!(
            %cart_id,
            product_id = %product.id,
            final_quantity = result.aggregate.final_quantity(),
            final_price = %result.aggregate.final_price(),
            "added item"
        );
        Ok(result.aggregate)
    }

    /// Removes a line from a cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cmd: RemoveItem) -> Result<Cart> {
        let cart_id = cmd.cart_id;
        let line_item_id = cmd.line_item_id;

        let result = self
            .carts
            .execute(cart_id, None, |cart| {
                cart.ensure_exists(cart_id)?;
                cart.remove_line(line_item_id)
            })
            .await?;

        metrics::counter!("cart_items_removed_total").increment(1);
        tracing::debug!(%cart_id, %line_item_id, "removed item");
        Ok(result.aggregate)
    }

    /// Sets a line's quantity at the product's current price.
    #[tracing::instrument(skip(self))]
    pub async fn change_quantity(&self, cmd: ChangeQuantity) -> Result<Cart> {
        let quantity = validate_quantity(cmd.quantity)?;
        let user = cmd.identity.require_user()?;
        let cart_id = cmd.cart_id;
        let line_item_id = cmd.line_item_id;

        let cart = self.carts.load(cart_id).await?;
        let product_id = cart
            .editable_line(cart_id, line_item_id, user)?
            .product_id()
            .clone();
        let product = self.catalog.get_product(&product_id).await?;
        product.check_price()?;

        let result = self
            .carts
            .execute(cart_id, Some(user), |cart| {
                cart.ensure_exists(cart_id)?;
                cart.change_quantity(line_item_id, quantity, product.unit_price, user)
            })
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("cart_quantity_changes_total").increment(1);
        }
        tracing::debug!(%cart_id, %line_item_id, quantity, "changed quantity");
        Ok(result.aggregate)
    }

    /// Checks a cart out into a new order.
    ///
    /// The cart close, the order and the shopper update are one commit.
    #[tracing::instrument(skip(self, cmd), fields(cart_id = %cmd.cart_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        let user = cmd.identity.require_user()?;
        let details = cmd.form.validate(Utc::now().date_naive())?;
        let cart_id = cmd.cart_id;

        self.with_retries(Cart::aggregate_type(), cart_id, || {
            self.try_place_order(cart_id, user, &details)
        })
        .await
    }

    /// Loads a cart by id.
    pub async fn get_cart(&self, cart_id: AggregateId) -> Result<Option<Cart>> {
        self.carts.load_existing(cart_id).await
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>> {
        self.orders.load_existing(order_id).await
    }

    /// Loads an order the caller owns.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_for(&self, identity: Identity, order_id: AggregateId) -> Result<Order> {
        let user = identity.require_user()?;
        let order = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Order", order_id))?;

        if order.owner() != Some(user) {
            return Err(CheckoutError::Authorization {
                user: user.to_string(),
                entity: "Order",
                id: order_id.to_string(),
            });
        }
        Ok(order)
    }

    /// The user's placed orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for(&self, user: UserId) -> Result<Vec<Order>> {
        let shopper = self.shoppers.load(shopper_id(user)).await?;

        let mut orders = Vec::with_capacity(shopper.closed_carts().len());
        for closed in shopper.closed_carts().iter().rev() {
            if let Some(order) = self.get_order(closed.order_id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn try_resolve_cart(&self, user: UserId) -> Result<Cart> {
        let shopper_id = shopper_id(user);
        let shopper = self.shoppers.load(shopper_id).await?;

        if let Some(cart_id) = shopper.open_cart() {
            return match self.carts.load_existing(cart_id).await? {
                Some(cart) if cart.is_open() => Ok(cart),
                _ => Err(CheckoutError::InvalidState(format!(
                    "open cart {cart_id} of user {user} is missing or closed"
                ))),
            };
        }

        let cart_id = AggregateId::new();
        let now = Utc::now();
        let mut cart = Cart::default();
        let cart_events = cart.open(cart_id, user, now)?;
        let shopper_events = shopper.assign_cart(user, cart_id, now)?;

        let versions = self
            .store
            .append_batch(vec![
                self.carts.stage(cart_id, Some(user), &cart, &cart_events)?,
                self.shoppers.stage(shopper_id, Some(user), &shopper, &shopper_events)?,
            ])
            .await?;

        cart.apply_events(cart_events);
        cart.set_version(versions.first().copied().unwrap_or_else(Version::first));

        metrics::counter!("carts_opened_total").increment(1);
        tracing::info!(%cart_id, %user, "opened cart");
        Ok(cart)
    }

    async fn try_place_order(
        &self,
        cart_id: AggregateId,
        user: UserId,
        details: &OrderDetails,
    ) -> Result<Order> {
        let cart = self.carts.load(cart_id).await?;
        cart.authorize(cart_id, user)?;

        let order_id = AggregateId::new();
        let now = Utc::now();
        let cart_events = cart.check_out(order_id, now)?;

        let mut order = Order::default();
        let order_events = order.place(OrderPlacedData {
            order_id,
            owner: user,
            cart_id,
            details: details.clone(),
            items: cart.items().to_vec(),
            totals: cart.totals(),
            created_at: now,
        })?;

        let shopper_id = shopper_id(user);
        let shopper = self.shoppers.load(shopper_id).await?;
        let shopper_events = shopper.close_cart(user, cart_id, order_id, now)?;

        let versions = self
            .store
            .append_batch(vec![
                self.carts.stage(cart_id, Some(user), &cart, &cart_events)?,
                self.orders.stage(order_id, Some(user), &order, &order_events)?,
                self.shoppers.stage(shopper_id, Some(user), &shopper, &shopper_events)?,
            ])
            .await?;

        order.apply_events(order_events);
        order.set_version(versions.get(1).copied().unwrap_or_else(Version::first));

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            %order_id,
            %cart_id,
            %user,
            final_price = %order.final_price(),
            final_quantity = order.final_quantity(),
            "placed order"
        );
        Ok(order)
    }

    /// Re-runs `attempt` while it loses optimistic-concurrency races.
    async fn with_retries<T, F, Fut>(
        &self,
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(e) if e.is_conflict() && retries < self.config.max_conflict_retries => {
                    retries += 1;
                    record_retry(aggregate_type, aggregate_id, retries);
                }
                result => return result,
            }
        }
    }
}

impl<S, C> std::fmt::Debug for CheckoutService<S, C>
where
    S: EventStore + Clone,
    C: ProductCatalog,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
