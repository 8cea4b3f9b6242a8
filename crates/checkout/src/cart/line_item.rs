use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ProductId;
use crate::money::Money;

/// Identifier of a line within a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LineItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One product in a cart.
///
/// The subtotal is not stored; it is always `quantity × unit_price` of the
/// current values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    product_id: ProductId,
    title: String,
    unit_price: Money,
    quantity: u32,
    added_by: UserId,
}

impl LineItem {
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        title: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        added_by: UserId,
    ) -> Self {
        Self {
            id,
            product_id,
            title: title.into(),
            unit_price,
            quantity,
            added_by,
        }
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Price recorded at the line's last mutation.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The user who first put this product in the cart.
    pub fn added_by(&self) -> UserId {
        self.added_by
    }

    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    pub(crate) fn requantify(&mut self, quantity: u32, unit_price: Money) {
        self.quantity = quantity;
        self.unit_price = unit_price;
    }
}
