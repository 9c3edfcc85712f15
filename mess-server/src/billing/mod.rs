//! Billing core
//!
//! - [`calculator`]: billable meals to per-user bill lines
//! - [`allocator`]: payment amount to whole unpaid meals, oldest first
//! - [`reconcile`]: paid/due/status derived from per-meal payments
//! - [`service`]: the operations the HTTP layer calls

pub mod allocator;
pub mod calculator;
pub mod period;
pub mod pricing;
pub mod reconcile;
pub mod service;
pub mod validation;

pub use period::BillingPeriod;
pub use pricing::MealPricing;
pub use service::{BillingService, PaymentOutcome, RecordPayment};
