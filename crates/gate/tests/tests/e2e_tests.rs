#[path = "e2e/accept_flow.rs"]
mod accept_flow;

#[path = "e2e/reject_flow.rs"]
mod reject_flow;

#[path = "e2e/process_engine.rs"]
mod process_engine;

#[path = "e2e/determinism.rs"]
mod determinism;
