// Photo uploads plus AI enhancement and headshot generation.
// Provider calls, polling and result storage sit behind the orchestrator.

pub mod artifacts;
pub mod handlers;
pub mod materializer;
pub mod options;
pub mod orchestrator;
pub mod poll;
pub mod provider;
pub mod records;

#[cfg(test)]
pub(crate) mod testing;
