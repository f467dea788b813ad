#[path = "adversarial/bypass_gate.rs"]
mod bypass_gate;

#[path = "adversarial/path_escape.rs"]
mod path_escape;
