pub mod effect_inference_service;

pub use effect_inference_service::EffectInferenceService;
