mod average_precision;
mod config;
mod highlight;
mod identity;
mod interval;
mod matching;
mod moment_retrieval;
mod pool;
mod report;
mod run;
#[cfg(test)]
mod tests;

pub use highlight::relevant_clip_ids_from_windows;
pub use run::run;
