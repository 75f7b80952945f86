pub mod category;
pub mod context;
pub mod engine;
pub mod matcher;
pub mod purchase;
pub mod shop;

pub use crate::domain::model::{BestGood, Client, Good, PurchaseResult, ScanMessage, Scope};
pub use crate::domain::ports::{ActivityLog, GoodStore, LogEntry};
pub use crate::utils::error::Result;
