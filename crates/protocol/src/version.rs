//! Host-reported protocol versions and field-wise comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Version assumed when a host does not report one during the handshake.
pub const DEFAULT_HOST_VERSION: &str = "2.0.1";

/// Dotted numeric version such as `1.9.0`.
///
/// Comparison is field by field; a missing trailing field counts as zero, so
/// `1.9` equals `1.9.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostVersion {
	raw: String,
	fields: Vec<u32>,
}

impl HostVersion {
	/// Parses a dotted version string.
	pub fn parse(raw: &str) -> Result<Self, InvalidVersion> {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			return Err(InvalidVersion(raw.to_string()));
		}
		let fields = trimmed
			.split('.')
			.map(|part| part.parse::<u32>())
			.collect::<Result<Vec<_>, _>>()
			.map_err(|_| InvalidVersion(raw.to_string()))?;
		Ok(Self {
			raw: trimmed.to_string(),
			fields,
		})
	}

	/// Returns the version as originally written.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Returns true if this version is at least `minimum`.
	pub fn satisfies(&self, minimum: &HostVersion) -> bool {
		self >= minimum
	}

	fn field(&self, index: usize) -> u32 {
		self.fields.get(index).copied().unwrap_or(0)
	}
}

impl PartialEq for HostVersion {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for HostVersion {}

impl PartialOrd for HostVersion {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for HostVersion {
	fn cmp(&self, other: &Self) -> Ordering {
		let len = self.fields.len().max(other.fields.len());
		(0..len)
			.map(|i| self.field(i).cmp(&other.field(i)))
			.find(|ord| *ord != Ordering::Equal)
			.unwrap_or(Ordering::Equal)
	}
}

impl fmt::Display for HostVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl FromStr for HostVersion {
	type Err = InvalidVersion;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for HostVersion {
	type Error = InvalidVersion;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<HostVersion> for String {
	fn from(version: HostVersion) -> Self {
		version.raw
	}
}

/// A version string that is not a dotted list of integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVersion(pub String);

impl fmt::Display for InvalidVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "invalid version string: \"{}\"", self.0)
	}
}

impl std::error::Error for InvalidVersion {}
