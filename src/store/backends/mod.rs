//! Backend implementations of [`DocumentStore`](crate::store::DocumentStore).
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | MongoDB | [`mongo`] | Production catalog databases |
//! | In-memory | [`memory`] | Tests |
//!
//! Both backends must agree on filter semantics, in particular that
//! [`Filter::IsNull`](crate::store::Filter::IsNull) never matches an absent
//! field.

pub mod memory;
pub mod mongo;
