use std::fmt;

/// Coarse classification of a provider failure.
///
/// The scheduler retries every kind the same way; the kind exists so that
/// log lines can be filtered and aggregated without parsing messages.
///
/// | Kind | Typical cause |
/// |------|---------------|
/// | `Transport` | connection refused, DNS, non-success HTTP status |
/// | `Timeout` | transport timeout elapsed |
/// | `Authentication` | missing or rejected credentials (401/403) |
/// | `RateLimit` | provider throttling (429/418) |
/// | `Data` | unknown symbol, unparsable or invalid payload |
/// | `Unexpected` | panic or bug inside an adapter |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProviderErrorKind {
    Transport,
    Timeout,
    Authentication,
    RateLimit,
    Data,
    Unexpected,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Data => "data",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
