//! Declared error contracts
//!
//! Every API operation declares which error codes it can answer with. A
//! contract pairs a code with the user-facing notice, an internal reason
//! template and the reporting flags used when the code is raised.

use tracing::debug;

use crate::route::RouteError;

/// Declarative mapping from an error code to its protocol answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContract {
    code: String,
    notice: String,
    reason: String,
    alarm: bool,
    logging: bool,
    description: String,
}

impl ErrorContract {
    /// Contract for `code` with empty notice and reason and reporting disabled
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            notice: String::new(),
            reason: String::new(),
            alarm: false,
            logging: false,
            description: String::new(),
        }
    }

    /// Message shown to the end user
    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }

    /// Internal reason template
    ///
    /// Rendered against the raised error's description, see
    /// [`Description::render`](crate::description::Description::render).
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Raise an alarm whenever this code is answered
    #[must_use]
    pub fn with_alarm(mut self, alarm: bool) -> Self {
        self.alarm = alarm;
        self
    }

    /// Log whenever this code is answered
    #[must_use]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Internal description used as reason when no template is set
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn notice(&self) -> &str {
        &self.notice
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn alarm(&self) -> bool {
        self.alarm
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// The contracts declared by one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContracts {
    contracts: Vec<ErrorContract>,
}

impl ErrorContracts {
    /// No declared contracts
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a contract
    #[must_use]
    pub fn with(mut self, contract: ErrorContract) -> Self {
        self.contracts.push(contract);
        self
    }

    /// Contract declared for `code`, first declaration wins
    pub fn lookup(&self, code: &str) -> Option<&ErrorContract> {
        self.contracts.iter().find(|c| c.code == code)
    }

    /// Reject blank and duplicated codes
    pub fn validate(&self, handler: &str) -> Result<(), RouteError> {
        for (index, contract) in self.contracts.iter().enumerate() {
            if contract.code.trim().is_empty() {
                return Err(RouteError::BlankErrorCode {
                    handler: handler.to_string(),
                });
            }
            if self.contracts[..index].iter().any(|c| c.code == contract.code) {
                return Err(RouteError::DuplicateErrorCode {
                    handler: handler.to_string(),
                    code: contract.code.clone(),
                });
            }
        }
        debug!(handler, count = self.contracts.len(), "error contracts validated");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorContract> {
        self.contracts.iter()
    }
}

impl FromIterator<ErrorContract> for ErrorContracts {
    fn from_iter<I: IntoIterator<Item = ErrorContract>>(iter: I) -> Self {
        Self {
            contracts: iter.into_iter().collect(),
        }
    }
}

impl From<ErrorContract> for ErrorContracts {
    fn from(contract: ErrorContract) -> Self {
        Self {
            contracts: vec![contract],
        }
    }
}
