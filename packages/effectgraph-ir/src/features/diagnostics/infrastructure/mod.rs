pub mod effects_reporter;

pub use effects_reporter::EffectsReporter;
