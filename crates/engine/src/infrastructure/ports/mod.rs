//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Narration (could swap Gemini -> another chat model)
//! - Image generation (portraits)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;
pub mod types;

// =============================================================================
// Conversation Types
// =============================================================================
pub use types::{
    Blob, ChatHandle, ChatSetup, Content, FunctionCall, FunctionResponse, Part, RawTurn, Role,
    ToolCall, ToolDefinition, Transcript, TurnPart,
};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{ImageGenPort, ImageRequest, ImageResult, NarrationPort};

#[cfg(test)]
pub use external::{MockImageGenPort, MockNarrationPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ImageGenError, NarrationError};
