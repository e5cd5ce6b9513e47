pub mod enrich_groups;

pub use enrich_groups::enrich_groups;
