use anyhow::{Context, Result};
use regex::Regex;

/// Which `ExtractedTransaction` field a pattern fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Merchant,
    Timestamp,
    Amount,
}

impl Field {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Timestamp => "timestamp",
            Self::Amount => "amount",
        }
    }
}

/// Transformation applied to the first capture group of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostProcess {
    Verbatim,
    /// Remove `.` thousands separators.
    StripThousands,
}

impl PostProcess {
    pub(crate) fn apply(&self, captured: &str) -> String {
        match self {
            Self::Verbatim => captured.to_string(),
            Self::StripThousands => captured.replace('.', ""),
        }
    }
}

/// A field, the regex that finds it, and how to clean the capture.
pub(crate) struct PatternSpec {
    pub(crate) field: Field,
    pub(crate) pattern: &'static str,
    pub(crate) post: PostProcess,
}

/// Patterns for the "Cargo en Cuenta" notification, e.g.
/// `Realizaste una compra por $15.000 en Farmacia Cruz Verde el 05/03/2024 13:45`.
pub(crate) const CHARGE_NOTIFICATION: &[PatternSpec] = &[
    PatternSpec {
        field: Field::Merchant,
        pattern: r"en (.*?) el",
        post: PostProcess::Verbatim,
    },
    PatternSpec {
        field: Field::Timestamp,
        pattern: r"el ([0-9]{2}/[0-9]{2}/[0-9]{4} [0-9]{2}:[0-9]{2})",
        post: PostProcess::Verbatim,
    },
    PatternSpec {
        field: Field::Amount,
        pattern: r"compra por \$([0-9]+(?:\.[0-9]{3})*)",
        post: PostProcess::StripThousands,
    },
];

pub(crate) struct CompiledPattern {
    pub(crate) field: Field,
    regex: Regex,
    post: PostProcess,
}

impl CompiledPattern {
    pub(crate) fn compile(spec: &PatternSpec) -> Result<Self> {
        let regex = Regex::new(spec.pattern)
            .with_context(|| format!("Invalid {} pattern: {}", spec.field.as_str(), spec.pattern))?;
        Ok(Self {
            field: spec.field,
            regex,
            post: spec.post,
        })
    }

    /// First match wins; returns the post-processed first capture group.
    pub(crate) fn find(&self, body: &str) -> Option<String> {
        self.regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| self.post.apply(m.as_str()))
    }
}
