use checkout::{
    AddItem, Aggregate, Cart, CartEvent, CheckoutService, DomainEvent, Identity, InMemoryCatalog,
    Money, OrderForm, PlaceOrder, Product, UserId, recount,
};
use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{AppendOptions, EventEnvelope, EventStore, InMemoryEventStore, Version};

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products((0..50).map(|i| {
        Product::new(
            format!("SKU-{i:03}"),
            format!("Product {i}"),
            Money::from_cents(100 + i),
        )
    }))
}

fn order_form() -> OrderForm {
    OrderForm {
        first_name: "Bench".to_string(),
        last_name: "Mark".to_string(),
        phone: "555-0100".to_string(),
        delivery_date: chrono::Utc::now()
            .date_naive()
            .format("%Y-%m-%d")
            .to_string(),
        ..OrderForm::default()
    }
}

fn make_envelope(aggregate_id: AggregateId, version: i64, event: &CartEvent) -> EventEnvelope {
    EventEnvelope::record(
        aggregate_id,
        "Cart",
        event.event_type(),
        Version::new(version),
        event,
    )
    .unwrap()
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(InMemoryEventStore::new(), catalog());
    let identity = Identity::User(UserId::new());
    let cart_id = rt
        .block_on(service.resolve_cart(identity))
        .unwrap()
        .id()
        .unwrap();

    c.bench_function("checkout/add_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .add_item(AddItem::new(cart_id, "SKU-007", identity))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_full_checkout_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkout/resolve_add_place", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = CheckoutService::new(InMemoryEventStore::new(), catalog());
                let identity = Identity::User(UserId::new());
                let cart_id = service.resolve_cart(identity).await.unwrap().id().unwrap();

                for sku in ["SKU-001", "SKU-002", "SKU-001"] {
                    service
                        .add_item(AddItem::new(cart_id, sku, identity))
                        .await
                        .unwrap();
                }

                service
                    .place_order(PlaceOrder::new(cart_id, order_form(), identity))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_cart_reconstruction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let cart_id = AggregateId::new();
    let user = UserId::new();
    let products: Vec<Product> = (0..50)
        .map(|i| {
            Product::new(
                format!("SKU-{i:03}"),
                format!("Product {i}"),
                Money::from_cents(100 + i),
            )
        })
        .collect();

    // 1 open + 50 adds
    let mut envelopes = vec![make_envelope(
        cart_id,
        1,
        &CartEvent::cart_opened(cart_id, user, chrono::Utc::now()),
    )];
    for (i, product) in products.iter().enumerate() {
        let event = CartEvent::line_item_added(product, user);
        envelopes.push(make_envelope(cart_id, i as i64 + 2, &event));
    }
    rt.block_on(store.append(envelopes, AppendOptions::expect_new()))
        .unwrap();

    c.bench_function("checkout/rebuild_cart_51_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = store.get_events_for_aggregate(cart_id).await.unwrap();
                let mut cart = Cart::default();
                for envelope in events {
                    let event: CartEvent = envelope.decode().unwrap();
                    cart.apply(event);
                }
                cart
            })
        });
    });
}

fn bench_recount(c: &mut Criterion) {
    let user = UserId::new();
    let mut cart = Cart::default();
    let cart_id = AggregateId::new();
    let opened = cart.open(cart_id, user, chrono::Utc::now()).unwrap();
    cart.apply_events(opened);
    for i in 0..200 {
        let product = Product::new(format!("SKU-{i}"), "Item", Money::from_cents(99 + i));
        let events = cart.add_product(&product, user).unwrap();
        cart.apply_events(events);
    }

    c.bench_function("checkout/recount_200_lines", |b| {
        b.iter(|| recount(std::hint::black_box(cart.items())));
    });
}

criterion_group!(
    benches,
    bench_add_item,
    bench_full_checkout_cycle,
    bench_cart_reconstruction,
    bench_recount
);
criterion_main!(benches);
