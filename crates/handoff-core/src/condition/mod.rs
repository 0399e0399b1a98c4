//! Condition Module
//!
//! Conditions are single typed predicates over one field of the evaluation
//! context. They are written in rule files as flat records:
//!
//! ```yaml
//! conditions:
//!   - type: user_attribute
//!     field: tier
//!     operator: EQUALS
//!     value: vip
//!   - type: message_content
//!     field: content
//!     operator: REGEX_MATCHES
//!     value: 'ORD-\d{8}'
//!   - type: time_based
//!     operator: BETWEEN
//!     value: ["22:00", "06:00"]
//!     negate: true
//! ```
//!
//! The free-form `(type, field)` pair is resolved into a closed [`FieldRef`]
//! so the evaluator can match exhaustively on what it reads.
//!
//! ## Supported Operators
//! - `EQUALS`, `NOT_EQUALS`
//! - `CONTAINS`, `NOT_CONTAINS`, `STARTS_WITH`, `ENDS_WITH`, `REGEX_MATCHES`
//! - `GREATER_THAN`, `LESS_THAN`, `GREATER_EQUAL`, `LESS_EQUAL`, `IN_RANGE`
//! - `IN_LIST`, `NOT_IN_LIST`
//! - `IS_TRUE`, `IS_FALSE`
//! - `EXISTS`, `NOT_EXISTS`
//! - `BEFORE`, `AFTER`, `BETWEEN` (time-based only)

mod field;
mod time;
mod types;

pub use field::{FieldRef, MessageField, TriggerField};
pub use time::{TimeOfDay, TimeWindow};
pub use types::{Condition, ConditionKind, ConditionOperator};
