//! One-off database tasks run from the CLI.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Coupon, GuestUser, Order, Owner, Wishlist};
use crate::store::{Query, Result, Store};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub guests: usize,
    pub carts: usize,
    pub wishlists: usize,
}

/// Delete guests not seen for `older_than_days` together with their carts
/// and wishlists. A cart or wishlist goes with its guest even if it was
/// touched more recently; one whose guest record is already gone is removed
/// once it is itself untouched for as long.
pub async fn prune_guests(store: &Store, older_than_days: u32) -> Result<PruneReport> {
    let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
    prune_guests_before(store, cutoff).await
}

/// Whether a guest-owned document should go, given its owner's standing.
fn doomed(owner: &Owner, updated_at: DateTime<Utc>, cutoff: DateTime<Utc>, stale: &HashSet<Uuid>, known: &HashSet<Uuid>) -> bool {
    match owner {
        Owner::Guest(id) if stale.contains(id) => true,
        Owner::Guest(id) => !known.contains(id) && updated_at < cutoff,
        Owner::User(_) => false,
    }
}

async fn prune_guests_before(store: &Store, cutoff: DateTime<Utc>) -> Result<PruneReport> {
    let mut report = PruneReport::default();

    let guests: Vec<GuestUser> = store.find(&Query::new()).await?;
    let known: HashSet<Uuid> = guests.iter().map(|g| g.id).collect();
    let stale: HashSet<Uuid> = guests.iter().filter(|g| g.is_stale(cutoff)).map(|g| g.id).collect();

    let guest_owned = Query::new().filter("owner", json!({ "kind": "guest" }));

    let carts: Vec<Cart> = store.find(&guest_owned).await?;
    let doomed_carts: Vec<Uuid> =
        carts.iter().filter(|c| doomed(&c.owner, c.updated_at, cutoff, &stale, &known)).map(|c| c.id).collect();
    for id in doomed_carts {
        if store.delete::<Cart>(id).await? { report.carts += 1; }
    }

    let wishlists: Vec<Wishlist> = store.find(&guest_owned).await?;
    let doomed_wishlists: Vec<Uuid> =
        wishlists.iter().filter(|w| doomed(&w.owner, w.updated_at, cutoff, &stale, &known)).map(|w| w.id).collect();
    for id in doomed_wishlists {
        if store.delete::<Wishlist>(id).await? { report.wishlists += 1; }
    }

    for id in stale {
        if store.delete::<GuestUser>(id).await? { report.guests += 1; }
    }

    tracing::info!(guests = report.guests, carts = report.carts, wishlists = report.wishlists, %cutoff, "pruned stale guest data");
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recount {
    pub code: String,
    pub before: u32,
    pub after: u32,
}

/// Reset each coupon's `used_count` to the number of orders that carry it.
/// Returns the coupons whose count changed.
pub async fn recount_coupons(store: &Store) -> Result<Vec<Recount>> {
    let coupons: Vec<Coupon> = store.find(&Query::new()).await?;
    let mut changed = Vec::new();
    for mut coupon in coupons {
        let used = store.count::<Order>(&Query::new().filter("coupon_code", &coupon.code)).await?;
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        if used == coupon.used_count { continue; }

        tracing::info!(code = %coupon.code, before = coupon.used_count, after = used, "coupon usage recounted");
        changed.push(Recount { code: coupon.code.to_string(), before: coupon.used_count, after: used });
        coupon.used_count = used;
        coupon.updated_at = Utc::now();
        store.save(&coupon).await?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Address, Discount, LineItem, Product};
    use crate::domain::pricing::OrderTotals;
    use crate::domain::value_objects::{CouponCode, Money, Slug, Sku};

    #[tokio::test]
    async fn test_prune_removes_only_stale_guest_data() {
        let store = Store::memory();
        let old = Utc::now() - Duration::days(60);

        let mut stale = GuestUser::new();
        stale.last_seen_at = old;
        let fresh = GuestUser::new();
        store.insert(&stale).await.unwrap();
        store.insert(&fresh).await.unwrap();

        let mut stale_cart = Cart::new(stale.owner());
        stale_cart.updated_at = old;
        let fresh_cart = Cart::new(fresh.owner());
        let mut user_cart = Cart::new(Owner::User("u1".into()));
        user_cart.updated_at = old;
        for cart in [&stale_cart, &fresh_cart, &user_cart] {
            store.insert(cart).await.unwrap();
        }
        let mut stale_list = Wishlist::new(stale.owner());
        stale_list.updated_at = old;
        store.insert(&stale_list).await.unwrap();

        let report = prune_guests(&store, 30).await.unwrap();
        assert_eq!(report, PruneReport { guests: 1, carts: 1, wishlists: 1 });
        assert!(store.get::<GuestUser>(fresh.id).await.unwrap().is_some());
        assert!(store.get::<Cart>(fresh_cart.id).await.unwrap().is_some());
        assert!(store.get::<Cart>(user_cart.id).await.unwrap().is_some());
        assert!(store.get::<Cart>(stale_cart.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_follows_the_owning_guest() {
        let store = Store::memory();
        let old = Utc::now() - Duration::days(60);

        // Stale guest whose cart and wishlist were touched recently.
        let mut stale = GuestUser::new();
        stale.last_seen_at = old;
        store.insert(&stale).await.unwrap();
        store.insert(&Cart::new(stale.owner())).await.unwrap();
        store.insert(&Wishlist::new(stale.owner())).await.unwrap();

        // Active guest whose cart has not changed in a while.
        let active = GuestUser::new();
        store.insert(&active).await.unwrap();
        let mut idle_cart = Cart::new(active.owner());
        idle_cart.updated_at = old;
        store.insert(&idle_cart).await.unwrap();

        // Recent cart of a guest that no longer exists.
        let orphan = Cart::new(Owner::Guest(Uuid::new_v4()));
        store.insert(&orphan).await.unwrap();

        let report = prune_guests(&store, 30).await.unwrap();
        assert_eq!(report, PruneReport { guests: 1, carts: 1, wishlists: 1 });
        assert!(store.find_one::<Cart>(Query::new().filter("owner", &stale.owner())).await.unwrap().is_none());
        assert!(store.find_one::<Wishlist>(Query::new().filter("owner", &stale.owner())).await.unwrap().is_none());
        assert!(store.get::<Cart>(idle_cart.id).await.unwrap().is_some());
        assert!(store.get::<Cart>(orphan.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recount_coupons() {
        let store = Store::memory();
        let code = CouponCode::new("WELCOME10").unwrap();
        let mut coupon = Coupon::create(code.clone(), Discount::Fixed(Money::from_cents(1_000)));
        coupon.used_count = 7;
        store.insert(&coupon).await.unwrap();

        let product = Product::create(Sku::new("P1").unwrap(), "Scarf", Slug::new("scarf").unwrap(), Money::from_cents(5_000));
        for _ in 0..2 {
            let item = LineItem::snapshot(&product, 1);
            let mut order = Order::place(Owner::Guest(Uuid::new_v4()), "a@b.co", "A", vec![item], Address::default(), OrderTotals::default()).unwrap();
            order.coupon_code = Some(code.clone());
            store.insert(&order).await.unwrap();
        }

        let changed = recount_coupons(&store).await.unwrap();
        assert_eq!(changed, vec![Recount { code: "WELCOME10".into(), before: 7, after: 2 }]);
        let coupon: Coupon = store.fetch(coupon.id).await.unwrap();
        assert_eq!(coupon.used_count, 2);
        assert!(recount_coupons(&store).await.unwrap().is_empty());
    }
}
