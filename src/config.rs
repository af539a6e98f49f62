//! Configuration types for mortgage-document extraction.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config between the eager, file and streaming entry points and
//! to log exactly what a run was asked to do.
//!
//! # Collaborators
//! The OCR client, the property-tax lookup and the progress callback are
//! trait objects. Leaving them unset selects the HTTP implementations; tests
//! and offline runs inject their own.

use crate::error::ExtractError;
use crate::pipeline::ocr::DocumentAiClient;
use crate::pipeline::tax::PropertyTaxLookup;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Azure-hosted Mistral OCR route used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str =
    "https://dines-mbf128eg-swedencentral.services.ai.azure.com/providers/mistral/azure/ocr";

/// Document-AI model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistral-document-ai-2505";

/// Environment variable read for the API key.
pub const DEFAULT_API_KEY_ENV: &str = "AZURE_API_KEY";

/// Placeholder for the insurance/PMI column until a real source exists.
pub const DEFAULT_INSURANCE_AND_PMI: &str = "$ 76 , 273 , 957.85 AND NA";

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use mortgage_extract::{ExtractionConfig, FieldMode, OutputFormat};
///
/// let config = ExtractionConfig::builder()
///     .field_mode(FieldMode::Text)
///     .output_format(OutputFormat::Text)
///     .pacing_ms(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.pacing_ms, 500);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// OCR service URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier sent with every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Explicit API key. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key. Default: `AZURE_API_KEY`.
    pub api_key_env: String,

    /// Value types requested from the service. Default: [`FieldMode::Numeric`].
    pub field_mode: FieldMode,

    /// Report format written by `process_to_file`. Default: xlsx.
    pub output_format: OutputFormat,

    /// Delay after each successfully processed image, in milliseconds.
    /// Default: 2000.
    ///
    /// The service rate-limits per key; a fixed pause keeps a long batch
    /// under the limit without needing retry logic.
    pub pacing_ms: u64,

    /// Per-OCR-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Text of the insurance/PMI column.
    pub insurance_and_pmi: String,

    /// Pre-constructed OCR client. Takes precedence over the credential.
    pub client: Option<Arc<dyn DocumentAiClient>>,

    /// Property-tax lookup. If None, the Wikipedia lookup is used.
    pub tax_lookup: Option<Arc<dyn PropertyTaxLookup>>,

    /// Per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            field_mode: FieldMode::default(),
            output_format: OutputFormat::default(),
            pacing_ms: 2000,
            api_timeout_secs: 60,
            insurance_and_pmi: DEFAULT_INSURANCE_AND_PMI.to_string(),
            client: None,
            tax_lookup: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("field_mode", &self.field_mode)
            .field("output_format", &self.output_format)
            .field("pacing_ms", &self.pacing_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("client", &self.client.as_ref().map(|_| "<dyn DocumentAiClient>"))
            .field(
                "tax_lookup",
                &self.tax_lookup.as_ref().map(|_| "<dyn PropertyTaxLookup>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.config.api_key_env = var.into();
        self
    }

    pub fn field_mode(mut self, mode: FieldMode) -> Self {
        self.config.field_mode = mode;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn pacing_ms(mut self, ms: u64) -> Self {
        self.config.pacing_ms = ms.min(60_000);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn insurance_and_pmi(mut self, text: impl Into<String>) -> Self {
        self.config.insurance_and_pmi = text.into();
        self
    }

    pub fn client(mut self, client: Arc<dyn DocumentAiClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn tax_lookup(mut self, lookup: Arc<dyn PropertyTaxLookup>) -> Self {
        self.config.tax_lookup = Some(lookup);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.client.is_none() && !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(ExtractError::InvalidConfig(format!(
                "Endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_key_env.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "API key environment variable name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Value types requested for the seven numeric fields.
///
/// `Numeric` asks the service to return numbers directly. `Text` asks for
/// every field as a string, the way the figures are printed on the page, and
/// leaves conversion to the local phrase parser. Either way, text that does
/// come back is converted locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    #[default]
    Numeric,
    Text,
}

/// Report format written by `process_to_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `output.xlsx`, one header row plus one row per record. (default)
    #[default]
    Xlsx,
    /// `output.txt`, comma-separated, header line first.
    Text,
}

impl OutputFormat {
    /// File name written into the output folder.
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "output.xlsx",
            OutputFormat::Text => "output.txt",
        }
    }
}
