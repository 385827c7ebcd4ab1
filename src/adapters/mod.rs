// Adapters layer: concrete implementations of the domain ports (index, scraper, storage, sink).

pub mod accepted_papers;
pub mod dblp;
pub mod sink;
pub mod storage;
