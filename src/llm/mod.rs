pub mod auth;
pub mod client;
pub mod credentials;
pub mod gemini;
pub mod pricing;
pub mod prompt;

pub use auth::{AuthError, ServiceAccountAuthenticator};
pub use client::{Generation, GenerativeClient, LLMError};
pub use credentials::{AuthMode, Credentials};
pub use gemini::{Endpoints, GeminiClient};
pub use pricing::{CostCalculator, PricingEntry, PricingTable, UsageReport, estimate_tokens};
pub use prompt::build_prompt;
