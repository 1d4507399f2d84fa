//! Cross-crate scenarios driven through the node-runtime pipeline.

mod ingestion;
mod integrity;
mod leadership;
mod reconciliation;
