//! Cart aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::catalog::{Product, ProductId};
use crate::money::Money;

use super::{
    CartError, CartEvent, CartState, CartTotals, LineItem, LineItemId,
    events::{CartOpenedData, LineItemAddedData, LineItemQuantityChangedData},
    recount,
};

/// Cart aggregate root.
///
/// Holds one shopping session's line items in insertion order. The totals
/// have no setter: [`recount`] rewrites them after every line item event.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    id: Option<AggregateId>,
    version: Version,
    owner: Option<UserId>,
    anonymous: bool,
    state: CartState,
    items: Vec<LineItem>,
    totals: CartTotals,
    order_id: Option<AggregateId>,
    opened_at: Option<DateTime<Utc>>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::CartOpened(data) => self.apply_opened(data),
            CartEvent::LineItemAdded(data) => self.apply_line_added(data),
            CartEvent::LineItemQuantityChanged(data) => self.apply_quantity_changed(data),
            CartEvent::LineItemRemoved(data) => {
                self.items.retain(|item| item.id() != data.line_item_id);
                self.totals = recount(&self.items);
            }
            CartEvent::CartCheckedOut(data) => {
                self.state = CartState::Closed;
                self.order_id = Some(data.order_id);
            }
        }
    }
}

impl Cart {
    /// A fresh cart for a visitor without a session. Never persisted.
    pub fn anonymous() -> Self {
        Self {
            id: Some(AggregateId::new()),
            anonymous: true,
            opened_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

// Query methods
impl Cart {
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn state(&self) -> CartState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.can_modify_items()
    }

    /// Line items in the order they were first added.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn line_for_product(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id() == product_id)
    }

    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    pub fn final_price(&self) -> Money {
        self.totals.final_price
    }

    pub fn final_quantity(&self) -> u64 {
        self.totals.final_quantity
    }

    /// The order this cart was checked out into, once closed.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }
}

// Guards
impl Cart {
    pub fn ensure_exists(&self, cart_id: AggregateId) -> Result<(), CartError> {
        match self.id {
            Some(_) => Ok(()),
            None => Err(CartError::NotFound { cart_id }),
        }
    }

    /// Checks that cart `cart_id` exists and that `user` owns it.
    pub fn authorize(&self, cart_id: AggregateId, user: UserId) -> Result<(), CartError> {
        if self.anonymous {
            return Err(CartError::AnonymousCart);
        }
        self.ensure_exists(cart_id)?;
        match self.owner {
            Some(owner) if owner == user => Ok(()),
            _ => Err(CartError::NotOwner { user, cart_id }),
        }
    }

    /// Checks that `user` may change `line`: they added it or own the cart.
    pub fn authorize_line(&self, user: UserId, line: &LineItem) -> Result<(), CartError> {
        if line.added_by() == user || self.owner == Some(user) {
            Ok(())
        } else {
            Err(CartError::NotLineOwner {
                user,
                line_item_id: line.id(),
            })
        }
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), CartError> {
        if self.state.can_modify_items() {
            Ok(())
        } else {
            Err(CartError::Closed { action })
        }
    }

    fn require_line(&self, line_item_id: LineItemId) -> Result<&LineItem, CartError> {
        self.line_item(line_item_id)
            .ok_or(CartError::LineItemNotFound { line_item_id })
    }

    /// Checks that the cart total stays representable once line `target`
    /// (or a new line, when `None`) is set to `quantity` at `unit_price`.
    fn ensure_priceable(
        &self,
        target: Option<LineItemId>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<(), CartError> {
        let others = self
            .items
            .iter()
            .filter(|line| Some(line.id()) != target)
            .map(|line| line.unit_price().checked_multiply(line.quantity()));

        std::iter::once(unit_price.checked_multiply(quantity))
            .chain(others)
            .try_fold(Money::zero(), |total, subtotal| total.checked_add(subtotal?))
            .map(|_| ())
            .ok_or(CartError::QuantityOverflow)
    }

    /// Runs the checks every mutation of an existing cart starts with.
    pub fn check_mutable(
        &self,
        cart_id: AggregateId,
        user: UserId,
        action: &'static str,
    ) -> Result<(), CartError> {
        self.authorize(cart_id, user)?;
        self.ensure_open(action)
    }

    /// Finds a line `user` may change in open cart `cart_id`.
    pub fn editable_line(
        &self,
        cart_id: AggregateId,
        line_item_id: LineItemId,
        user: UserId,
    ) -> Result<&LineItem, CartError> {
        self.ensure_exists(cart_id)?;
        self.ensure_open("change quantity")?;
        let line = self.require_line(line_item_id)?;
        self.authorize_line(user, line)?;
        Ok(line)
    }
}

// Command methods (return events)
impl Cart {
    /// Opens a new, empty cart for `owner`.
    pub fn open(
        &self,
        cart_id: AggregateId,
        owner: UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<CartEvent>, CartError> {
        if self.id.is_some() {
            return Err(CartError::AlreadyOpened);
        }
        Ok(vec![CartEvent::cart_opened(cart_id, owner, at)])
    }

    /// Puts one unit of `product` in the cart.
    ///
    /// A product already in the cart gets its quantity bumped by one and its
    /// price refreshed; otherwise a new line with quantity 1 is appended.
    pub fn add_product(&self, product: &Product, user: UserId) -> Result<Vec<CartEvent>, CartError> {
        if self.anonymous {
            return Err(CartError::AnonymousCart);
        }
        self.ensure_open("add item")?;

        if !product.available {
            return Err(CartError::ProductUnavailable {
                product_id: product.id.clone(),
            });
        }

        match self.line_for_product(&product.id) {
            Some(line) => {
                let quantity = line
                    .quantity()
                    .checked_add(1)
                    .ok_or(CartError::QuantityOverflow)?;
                self.ensure_priceable(Some(line.id()), quantity, product.unit_price)?;
                Ok(vec![CartEvent::line_item_quantity_changed(
                    line,
                    quantity,
                    product.unit_price,
                )])
            }
            None => {
                self.ensure_priceable(None, 1, product.unit_price)?;
                Ok(vec![CartEvent::line_item_added(product, user)])
            }
        }
    }

    /// Takes a line out of the cart.
    pub fn remove_line(&self, line_item_id: LineItemId) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_open("remove item")?;
        let line = self.require_line(line_item_id)?;
        Ok(vec![CartEvent::line_item_removed(line)])
    }

    /// Sets a line's quantity, recording the current catalog price.
    ///
    /// Returns no events when neither quantity nor price changes.
    pub fn change_quantity(
        &self,
        line_item_id: LineItemId,
        quantity: u32,
        unit_price: Money,
        user: UserId,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }
        self.ensure_open("change quantity")?;

        let line = self.require_line(line_item_id)?;
        self.authorize_line(user, line)?;

        if line.quantity() == quantity && line.unit_price() == unit_price {
            return Ok(vec![]);
        }
        self.ensure_priceable(Some(line_item_id), quantity, unit_price)?;

        Ok(vec![CartEvent::line_item_quantity_changed(
            line, quantity, unit_price,
        )])
    }

    /// Freezes the cart for `order_id`.
    pub fn check_out(
        &self,
        order_id: AggregateId,
        at: DateTime<Utc>,
    ) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_open("place order")?;
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(vec![CartEvent::cart_checked_out(order_id, at, self.totals)])
    }
}

// Apply event helpers
impl Cart {
    fn apply_opened(&mut self, data: CartOpenedData) {
        self.id = Some(data.cart_id);
        self.owner = Some(data.owner);
        self.anonymous = false;
        self.state = CartState::Open;
        self.opened_at = Some(data.opened_at);
    }

    fn apply_line_added(&mut self, data: LineItemAddedData) {
        self.items.push(LineItem::new(
            data.line_item_id,
            data.product_id,
            data.title,
            data.unit_price,
            data.quantity,
            data.added_by,
        ));
        self.totals = recount(&self.items);
    }

    fn apply_quantity_changed(&mut self, data: LineItemQuantityChangedData) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id() == data.line_item_id) {
            item.requantify(data.new_quantity, data.unit_price);
        }
        self.totals = recount(&self.items);
    }
}
