//! Intent document model and loader.
//!
//! The intent is the declarative input: what the user wants running. It is
//! loaded from a JSON file (`berth.json` by default), validated, and passed
//! by value to the reconciler, read-only thereafter.
//!
//! # Bilingual keys
//!
//! The document historically accepted two parallel vocabularies. The loader
//! consolidates both into one canonical shape: `project` (aliases `name`,
//! `nome`), `origin` (aliases `image`, `origem`), `domain` (alias `dominio`),
//! `port` (alias `porta`), `resources` (alias `recursos`) with `cpu` and
//! `memory` (alias `memoria`), and `dev` with `volumes` and `command`.
//! Unknown keys are ignored.

use crate::constants::{DEFAULT_INTENT_FILE, MAX_INTENT_SIZE, MAX_ORIGIN_LEN};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// Intent
// =============================================================================

/// Desired state of one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Project identifier, used as the namespace for containers, the network,
    /// and the proxy route.
    pub project: String,
    /// Image reference pullable by the runtime.
    pub origin: String,
    /// Fully qualified host name, or `*.localhost` for local development.
    pub domain: String,
    /// Application port inside the container. 0 means the runtime chooses.
    pub port: u16,
    /// Resource limits.
    #[serde(default)]
    pub resources: Resources,
    /// Development overlay, applied when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<DevOverlay>,
}

/// CPU and memory limits for the container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Decimal fraction of one core, e.g. `"0.5"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory with unit suffix k/m/g, e.g. `"256mb"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Development-mode overlay: bind mounts and an alternative command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevOverlay {
    /// Bind mounts as `"host:container"` pairs.
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Override command.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Intent {
    /// Loads and validates an intent from a path.
    ///
    /// If `path` is a directory, `berth.json` inside it is read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(&path)
            .map_err(|e| Error::InvalidIntent(format!("cannot access {}: {e}", path.display())))?;
        if meta.is_dir() {
            path.push(DEFAULT_INTENT_FILE);
        }

        let data = std::fs::read(&path)
            .map_err(|e| Error::InvalidIntent(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&data)
    }

    /// Parses and validates an intent from JSON bytes.
    ///
    /// # Errors
    ///
    /// - Size exceeds [`MAX_INTENT_SIZE`]
    /// - JSON parsing fails
    /// - A required field is missing or out of range
    pub fn from_json(data: &[u8]) -> Result<Self> {
        if data.len() > MAX_INTENT_SIZE {
            return Err(Error::InvalidIntent(format!(
                "intent size {} exceeds limit of {}",
                data.len(),
                MAX_INTENT_SIZE
            )));
        }

        let doc: serde_json::Value =
            serde_json::from_slice(data).map_err(|e| Error::InvalidIntent(e.to_string()))?;

        Self::from_value(&doc)
    }

    /// Parses an intent from a `serde_json::Value`, consolidating key aliases.
    pub fn from_value(doc: &serde_json::Value) -> Result<Self> {
        let project = string_key(doc, &["project", "name", "nome"]).unwrap_or_default();
        let origin = string_key(doc, &["origin", "image", "origem"]).unwrap_or_default();
        let domain = string_key(doc, &["domain", "dominio"]).unwrap_or_default();
        let port = int_key(doc, &["port", "porta"]).unwrap_or(0);

        let resources = first_key(doc, &["resources", "recursos"])
            .map(|r| Resources {
                cpu: string_key(r, &["cpu"]),
                memory: string_key(r, &["memory", "memoria"]),
            })
            .unwrap_or_default();

        let dev = doc.get("dev").filter(|d| d.is_object()).map(|d| DevOverlay {
            volumes: string_list(d, "volumes"),
            command: string_list(d, "command"),
        });

        let intent = Self {
            project,
            origin,
            domain,
            port: u16::try_from(port)
                .map_err(|_| Error::InvalidIntent(format!("port {port} out of range 0-65535")))?,
            resources,
            dev,
        };
        intent.validate()?;
        Ok(intent)
    }

    /// Checks that the intent is complete.
    pub fn validate(&self) -> Result<()> {
        if self.project.is_empty() {
            return Err(Error::InvalidIntent("missing required field: project".to_string()));
        }
        if self.origin.is_empty() {
            return Err(Error::InvalidIntent("missing required field: origin".to_string()));
        }
        if self.origin.len() > MAX_ORIGIN_LEN {
            return Err(Error::InvalidIntent(format!(
                "origin exceeds maximum length of {MAX_ORIGIN_LEN}"
            )));
        }
        if self.domain.is_empty() {
            return Err(Error::InvalidIntent("missing required field: domain".to_string()));
        }
        Ok(())
    }

    /// Port the application listens on inside the container, substituting the
    /// default when the intent leaves it to the runtime.
    pub fn internal_port(&self) -> u16 {
        if self.port == 0 {
            crate::constants::DEFAULT_INTERNAL_PORT
        } else {
            self.port
        }
    }

    /// Returns true for `*.localhost` domains, which bypass DNS preflight.
    pub fn is_local_domain(&self) -> bool {
        self.domain.ends_with(".localhost")
    }
}

// =============================================================================
// Value Extraction Helpers
// =============================================================================

fn first_key<'a>(doc: &'a serde_json::Value, keys: &[&str]) -> Option<&'a serde_json::Value> {
    keys.iter().find_map(|k| doc.get(k))
}

fn string_key(doc: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| doc.get(k).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn int_key(doc: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| doc.get(k).and_then(|v| v.as_i64()))
}

fn string_list(doc: &serde_json::Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Resource Parsing
// =============================================================================

/// Converts a decimal CPU fraction to nanoCPUs, e.g. `"0.5"` → 500000000.
///
/// Returns `None` for absent or unparseable input.
pub fn parse_cpu(cpu: Option<&str>) -> Option<i64> {
    let value: f64 = cpu?.trim().parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    Some((value * 1e9) as i64)
}

/// Converts a memory string with k/m/g suffix to bytes as binary multiples,
/// e.g. `"256mb"` → 268435456. A bare number is taken as bytes.
///
/// Returns `None` for absent or unparseable input.
pub fn parse_memory(mem: Option<&str>) -> Option<i64> {
    let mem = mem?.trim().to_lowercase();
    let digits_end = mem.find(|c: char| !c.is_ascii_digit()).unwrap_or(mem.len());
    let value: i64 = mem[..digits_end].parse().ok()?;
    let multiplier = match mem[digits_end..].trim() {
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        "" => 1,
        _ => return None,
    };
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu() {
        assert_eq!(parse_cpu(Some("0.5")), Some(500_000_000));
        assert_eq!(parse_cpu(Some("2")), Some(2_000_000_000));
        assert_eq!(parse_cpu(Some("")), None);
        assert_eq!(parse_cpu(Some("lots")), None);
        assert_eq!(parse_cpu(None), None);
    }

    #[test]
    fn test_parse_memory_units() {
        assert_eq!(parse_memory(Some("512")), Some(512));
        assert_eq!(parse_memory(Some("4k")), Some(4096));
        assert_eq!(parse_memory(Some("256mb")), Some(256 * 1024 * 1024));
        assert_eq!(parse_memory(Some("1g")), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory(Some("1tb")), None);
        assert_eq!(parse_memory(None), None);
    }

    #[test]
    fn test_internal_port_default() {
        let mut intent = Intent {
            project: "api".to_string(),
            origin: "img:1".to_string(),
            domain: "api.example.com".to_string(),
            port: 0,
            resources: Resources::default(),
            dev: None,
        };
        assert_eq!(intent.internal_port(), 80);
        intent.port = 8080;
        assert_eq!(intent.internal_port(), 8080);
    }

    #[test]
    fn test_local_domain() {
        let intent = Intent {
            project: "app".to_string(),
            origin: "img:1".to_string(),
            domain: "app.localhost".to_string(),
            port: 0,
            resources: Resources::default(),
            dev: None,
        };
        assert!(intent.is_local_domain());
    }
}
