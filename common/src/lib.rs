//! Data model shared by the document store, the relational store and the
//! HTTP surface.

pub mod model;
pub mod requests;
