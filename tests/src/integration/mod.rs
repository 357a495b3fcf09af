//! Cross-crate ingest scenarios.

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod group_flows;
#[cfg(test)]
mod ingest_flows;
