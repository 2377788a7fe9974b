//! Known model context windows.
//!
//! The input token limit handed to the memory manager is the model's
//! context window minus headroom reserved for the reply.

/// Context window sizes for common models; matched by prefix, first hit wins.
pub const KNOWN_MODEL_LIMITS: &[(&str, u32)] = &[
    ("gpt-4o-mini", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("llama3", 8_192),
    ("qwen2.5", 32_768),
    ("mistral", 32_768),
];

/// Window assumed for models not in the registry.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 8_192;

/// Tokens reserved for the model's reply.
pub const DEFAULT_HEADROOM: u32 = 1_024;

pub fn context_window(model: &str) -> u32 {
    KNOWN_MODEL_LIMITS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW)
}

/// Effective input budget for `model`: context window minus reply headroom.
pub fn input_token_limit(model: &str) -> u32 {
    context_window(model).saturating_sub(DEFAULT_HEADROOM)
}
