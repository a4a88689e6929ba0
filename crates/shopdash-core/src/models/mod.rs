//! Data models for the shop dashboard.
//!
//! This module contains the records exchanged with the shop API:
//!
//! - `User`, `Transactions`: the signed-in identity and its payload
//! - `Product`, `ProductDraft`: catalog items
//! - `Category`, `Filter`, `WeightPrice`: catalog structure and shipping tiers
//! - `Order`, `Address`, `OrderStatus`: customer orders
//! - `DashboardStats`: analytics summary

pub mod catalog;
pub mod order;
pub mod product;
pub mod user;

pub use catalog::{Category, CategoryDraft, Filter, FilterDraft, WeightPrice, WeightPriceDraft};
pub use order::{Address, DashboardStats, Order, OrderStatus};
pub use product::{Product, ProductDraft};
pub use user::{Transactions, User};
