//! Validation diagnostics and document errors.

use std::fmt;

use thiserror::Error;

/// Declares a diagnostic code enum with its stable string form.
macro_rules! diagnostic_codes {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $code:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Stable code string, e.g. `E010`.
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

diagnostic_codes! {
    /// Problems that make a material or profile unusable.
    ErrorCode {
        /// Encoding name not in the catalog.
        UnknownEncoding => "E001",
        /// Override raw range outside 0..=255 or inverted.
        InvalidRawRange => "E002",
        /// Override value range not finite.
        InvalidValueRange => "E003",
        InvalidStepCount => "E010",
        InvalidQuality => "E011",
        /// z-scale or hit-power not positive, or negative z-bias.
        InvalidOcclusionParameter => "E012",
        /// CTM grid with a zero dimension.
        InvalidCtmGrid => "E020",
        /// Empty part, or one outside the reference size.
        InvalidPart => "E021",
        DuplicatePartName => "E022",
        InvalidTextureSize => "E023",
        InvalidTextureScale => "E024",
        OutOfRange => "E025",
    }
}

diagnostic_codes! {
    /// Suspicious but usable settings.
    WarningCode {
        /// A constant value hides an explicit texture of the same channel.
        ConstantShadowsTexture => "W001",
        /// Occlusion quality high enough to be slow.
        ExpensiveOcclusion => "W002",
        /// Both texture size and scale set; size wins.
        SizeAndScale => "W003",
    }
}

/// One validation finding, located by a dotted document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<C> {
    pub code: C,
    pub message: String,
    /// Field the finding is about, e.g. `occlusion.steps`.
    pub path: Option<String>,
}

pub type ValidationError = Diagnostic<ErrorCode>;
pub type ValidationWarning = Diagnostic<WarningCode>;

impl<C> Diagnostic<C> {
    pub fn new(code: C, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(code: C, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(code, message)
        }
    }
}

impl<C: fmt::Display> fmt::Display for Diagnostic<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        match &self.path {
            Some(path) => write!(f, " (at {})", path),
            None => Ok(()),
        }
    }
}

impl<C: fmt::Debug + fmt::Display> std::error::Error for Diagnostic<C> {}

/// Errors from reading or resolving documents.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("validation failed with {0} error(s)")]
    ValidationFailed(usize),

    #[error("unknown encoding standard '{0}'")]
    UnknownEncoding(String),

    #[error("invalid JSON document: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid YAML document: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("cannot read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Findings collected by one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Append the findings of another pass.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Warnings when there are no errors, the errors otherwise.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

/// Errors a batch run can report uniformly: a stable code plus a category.
pub trait BackendError: std::error::Error {
    /// Stable code, e.g. `PUBLISH_002`.
    fn code(&self) -> &'static str;

    fn message(&self) -> String {
        self.to_string()
    }

    /// Group name for related codes.
    fn category(&self) -> &'static str;
}
