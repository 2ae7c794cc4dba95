pub mod config;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod import_timetable;
pub mod normalizer;
pub mod output;
pub mod room_mapping;
pub mod row_emitter;
pub mod term_resolver;
