// Grounded generation: bounded-retry model calls, tagged-output parsing,
// and decision assembly.
// All model calls go through llm_client; no direct Anthropic calls here.

pub mod decision;
pub mod generator;
pub mod tags;
