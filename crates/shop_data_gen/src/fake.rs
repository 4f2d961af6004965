//! Fake data generation helpers.
//!
//! Wraps a seedable RNG so every value, including the ones drawn from the
//! `fake` crate, is reproducible from a single seed.

use crate::records::{round_cents, Gender, OrderStatus, PaymentMethod, PaymentStatus};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use fake::faker::address::en::{CityName, CountryName};
use fake::faker::company::en::CatchPhrase;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::seq::index;
use rand::Rng;

/// Product categories
const CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Books",
    "Sports & Outdoors",
    "Toys & Games",
    "Health & Beauty",
    "Automotive",
    "Food & Beverages",
    "Pet Supplies",
];

/// Product tier suffixes
const PRODUCT_TIERS: &[&str] = &["Pro", "Premium", "Deluxe", "Standard", "Basic"];

/// Outcome weights for the last payment attempt of an order
const FINAL_PAYMENT_WEIGHTS: &[(PaymentStatus, u32)] = &[
    (PaymentStatus::Completed, 3),
    (PaymentStatus::Pending, 1),
    (PaymentStatus::Refunded, 1),
];

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a full name
    pub fn full_name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    /// Generate an email address on a reserved domain
    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }

    pub fn gender(&mut self) -> Gender {
        *self.pick(Gender::ALL)
    }

    pub fn city(&mut self) -> String {
        CityName().fake_with_rng(&mut self.rng)
    }

    pub fn country(&mut self) -> String {
        CountryName().fake_with_rng(&mut self.rng)
    }

    /// Generate a product name: a catch phrase plus a tier
    pub fn product_name(&mut self) -> String {
        let phrase: String = CatchPhrase().fake_with_rng(&mut self.rng);
        let tier = *self.pick(PRODUCT_TIERS);
        format!("{} {}", phrase, tier)
    }

    /// Generate a category name
    pub fn category(&mut self) -> &'static str {
        *self.pick(CATEGORIES)
    }

    /// Generate a price rounded to cents
    pub fn price(&mut self, min: f64, max: f64) -> f64 {
        round_cents(self.rng.random_range(min..=max))
    }

    /// Generate a random integer in range
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Generate a boolean with given probability of true
    pub fn bool_with_probability(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Generate a date uniformly in `[start, end]`
    pub fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days().max(0);
        start + TimeDelta::days(self.rng.random_range(0..=span))
    }

    /// Generate a timestamp with whole seconds, uniformly from the start of
    /// `start` to the last second of `end`
    pub fn datetime_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDateTime {
        let from = start.and_time(NaiveTime::MIN);
        let until = end.and_time(NaiveTime::MIN) + TimeDelta::days(1) - TimeDelta::seconds(1);
        let span = (until - from).num_seconds().max(0);
        from + TimeDelta::seconds(self.rng.random_range(0..=span))
    }

    pub fn order_status(&mut self) -> OrderStatus {
        *self.pick(OrderStatus::ALL)
    }

    pub fn payment_method(&mut self) -> PaymentMethod {
        *self.pick(PaymentMethod::ALL)
    }

    /// Draw the outcome of an order's last payment attempt (never `Failed`)
    pub fn final_payment_status(&mut self) -> PaymentStatus {
        let total: u32 = FINAL_PAYMENT_WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut roll = self.rng.random_range(0..total);
        for (status, weight) in FINAL_PAYMENT_WEIGHTS {
            if roll < *weight {
                return *status;
            }
            roll -= weight;
        }
        PaymentStatus::Completed
    }

    /// Pick a random element from a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Pick a random id from a non-empty slice, returning the value
    pub fn pick_id(&mut self, ids: &[i64]) -> i64 {
        *self.pick(ids)
    }

    /// Sample up to `amount` distinct ids
    pub fn sample_ids(&mut self, ids: &[i64], amount: usize) -> Vec<i64> {
        let amount = amount.min(ids.len());
        index::sample(&mut self.rng, ids.len(), amount)
            .into_iter()
            .map(|i| ids[i])
            .collect()
    }
}
