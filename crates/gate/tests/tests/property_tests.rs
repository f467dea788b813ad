#[path = "property/generator_totality.rs"]
mod generator_totality;

#[path = "property/artifact_determinism.rs"]
mod artifact_determinism;

#[path = "property/run_id_boundaries.rs"]
mod run_id_boundaries;
