/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Only the local Ollama runtime is wired today. Adding another backend means
/// extending this enum and routing it in
/// [`LlmServiceProfiles`](crate::service_profiles::LlmServiceProfiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
}
