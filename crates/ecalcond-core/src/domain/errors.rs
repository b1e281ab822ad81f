pub type CondResult<T> = Result<T, EcalError>;
pub type ParserResult<T> = CondResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcalErrorCategory {
    InputParseError,
    ValidationError,
    IoSystemError,
    InternalError,
}

impl EcalErrorCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InputParseError => "InputParseError",
            Self::ValidationError => "ValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputParseError => 2,
            Self::ValidationError => 4,
            Self::IoSystemError => 3,
            Self::InternalError => 5,
        }
    }
}

/// Error currency of the conditions crate. Every failure site attaches a
/// stable machine-readable code (`PARSE.*`, `VALID.*`, `IO.*`, `SYS.*`) next
/// to the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} [{}] {}", .category.label(), .code, .message)]
pub struct EcalError {
    category: EcalErrorCategory,
    code: &'static str,
    message: String,
}

impl EcalError {
    pub fn new(
        category: EcalErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn parse(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EcalErrorCategory::InputParseError, code, message)
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EcalErrorCategory::ValidationError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EcalErrorCategory::IoSystemError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EcalErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> EcalErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}
