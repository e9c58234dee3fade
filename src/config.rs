//! Configuration types for the batch background-removal engine

use serde::{Deserialize, Serialize};

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG flattened onto a white background (no transparency)
    Jpeg,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Limits applied to source files before they enter the queue
///
/// These are presentation-layer policy made explicit: a frontend that wants
/// a confirm-override dialog instead of a hard rejection can probe sources
/// itself and build the config without guardrails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGuardrails {
    /// Maximum source file size in bytes
    pub max_file_bytes: u64,
    /// Maximum source dimensions (width, height)
    pub max_dimensions: (u32, u32),
}

impl Default for SourceGuardrails {
    fn default() -> Self {
        Self {
            max_file_bytes: 50 * 1024 * 1024,
            max_dimensions: (8000, 8000),
        }
    }
}

/// Configuration for the batch engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Output format for saved results
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Automatically save each result during batch runs
    pub auto_save: bool,

    /// Source limits applied at enqueue time (None disables the check)
    pub guardrails: Option<SourceGuardrails>,

    /// Enable debug mode (additional logging)
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: 95,
            auto_save: true,
            guardrails: Some(SourceGuardrails::default()),
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cutout::{EngineConfig, OutputFormat};
    ///
    /// let config = EngineConfig::builder()
    ///     .output_format(OutputFormat::Jpeg)
    ///     .jpeg_quality(90)
    ///     .auto_save(false)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - JPEG quality outside 0-100
    /// - Guardrail limits of zero
    pub fn validate(&self) -> crate::Result<()> {
        if self.jpeg_quality > 100 {
            return Err(crate::error::CutoutError::invalid_config(format!(
                "Invalid JPEG quality: {} (valid range: 0-100)",
                self.jpeg_quality
            )));
        }
        if let Some(guardrails) = &self.guardrails {
            if guardrails.max_file_bytes == 0 {
                return Err(crate::error::CutoutError::invalid_config(
                    "Guardrail max_file_bytes must be non-zero",
                ));
            }
            let (w, h) = guardrails.max_dimensions;
            if w == 0 || h == 0 {
                return Err(crate::error::CutoutError::invalid_config(
                    "Guardrail max_dimensions must be non-zero",
                ));
            }
        }
        Ok(())
    }
}

/// Builder for `EngineConfig`
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    #[must_use]
    pub fn auto_save(mut self, auto_save: bool) -> Self {
        self.config.auto_save = auto_save;
        self
    }

    #[must_use]
    pub fn guardrails(mut self, guardrails: Option<SourceGuardrails>) -> Self {
        self.config.guardrails = guardrails;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration, validating parameters
    ///
    /// # Errors
    /// Returns `InvalidConfig` when validation fails.
    pub fn build(self) -> crate::Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
