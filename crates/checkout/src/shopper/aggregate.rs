use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    ShopperError, ShopperEvent, shopper_id,
    events::{CartAssignedData, ShopperCartClosedData},
};

/// A cart the user has checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedCart {
    pub cart_id: AggregateId,
    pub order_id: AggregateId,
    pub closed_at: DateTime<Utc>,
}

/// Shopper aggregate root: which cart is open, which were checked out.
#[derive(Debug, Clone, Default)]
pub struct Shopper {
    id: Option<AggregateId>,
    version: Version,
    user: Option<UserId>,
    open_cart: Option<AggregateId>,
    closed_carts: Vec<ClosedCart>,
}

impl Aggregate for Shopper {
    type Event = ShopperEvent;
    type Error = ShopperError;

    fn aggregate_type() -> &'static str {
        "Shopper"
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
            ShopperEvent::CartAssigned(data) => self.apply_cart_assigned(data),
            ShopperEvent::CartClosed(data) => self.apply_cart_closed(data),
        }
    }
}

impl Shopper {
    /// The user's current open cart, if any.
    pub fn open_cart(&self) -> Option<AggregateId> {
        self.open_cart
    }

    /// Checked-out carts, oldest first.
    pub fn closed_carts(&self) -> &[ClosedCart] {
        &self.closed_carts
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    /// Makes `cart_id` the user's open cart.
    pub fn assign_cart(
        &self,
        user: UserId,
        cart_id: AggregateId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ShopperEvent>, ShopperError> {
        if let Some(open) = self.open_cart {
            return Err(ShopperError::CartAlreadyOpen { cart_id: open });
        }
        Ok(vec![ShopperEvent::CartAssigned(CartAssignedData {
            user,
            cart_id,
            assigned_at: at,
        })])
    }

    /// Clears the open cart after it was checked out into `order_id`.
    pub fn close_cart(
        &self,
        user: UserId,
        cart_id: AggregateId,
        order_id: AggregateId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ShopperEvent>, ShopperError> {
        if self.open_cart != Some(cart_id) {
            return Err(ShopperError::NotOpenCart { user, cart_id });
        }
        Ok(vec![ShopperEvent::CartClosed(ShopperCartClosedData {
            cart_id,
            order_id,
            closed_at: at,
        })])
    }

    fn apply_cart_assigned(&mut self, data: CartAssignedData) {
        if self.id.is_none() {
            self.id = Some(shopper_id(data.user));
            self.user = Some(data.user);
        }
        self.open_cart = Some(data.cart_id);
    }

    fn apply_cart_closed(&mut self, data: ShopperCartClosedData) {
        if self.open_cart == Some(data.cart_id) {
            self.open_cart = None;
        }
        self.closed_carts.push(ClosedCart {
            cart_id: data.cart_id,
            order_id: data.order_id,
            closed_at: data.closed_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_then_close() {
        let user = UserId::new();
        let cart_id = AggregateId::new();
        let order_id = AggregateId::new();
        let mut shopper = Shopper::default();

        let events = shopper.assign_cart(user, cart_id, Utc::now()).unwrap();
        shopper.apply_events(events);
        assert_eq!(shopper.id(), Some(shopper_id(user)));
        assert_eq!(shopper.open_cart(), Some(cart_id));

        let events = shopper
            .close_cart(user, cart_id, order_id, Utc::now())
            .unwrap();
        shopper.apply_events(events);
        assert_eq!(shopper.open_cart(), None);
        assert_eq!(shopper.closed_carts().len(), 1);
        assert_eq!(shopper.closed_carts()[0].order_id, order_id);
    }

    #[test]
    fn only_one_open_cart() {
        let user = UserId::new();
        let first = AggregateId::new();
        let mut shopper = Shopper::default();
        let events = shopper.assign_cart(user, first, Utc::now()).unwrap();
        shopper.apply_events(events);

        let result = shopper.assign_cart(user, AggregateId::new(), Utc::now());
        assert!(matches!(
            result,
            Err(ShopperError::CartAlreadyOpen { cart_id }) if cart_id == first
        ));
    }

    #[test]
    fn closing_a_foreign_cart_fails() {
        let user = UserId::new();
        let mut shopper = Shopper::default();
        let events = shopper
            .assign_cart(user, AggregateId::new(), Utc::now())
            .unwrap();
        shopper.apply_events(events);

        let result = shopper.close_cart(user, AggregateId::new(), AggregateId::new(), Utc::now());
        assert!(matches!(result, Err(ShopperError::NotOpenCart { .. })));
    }
}
