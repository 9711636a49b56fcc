//! Ownership labeling.
//!
//! Every container and network this tool creates carries a fixed set of
//! labels under the `io.berth.` prefix. The labels are the only mechanism
//! used to recognise managed objects: there is no in-process registry and no
//! state file. Discovery queries MUST filter on [`managed_filter`] so the
//! tool never touches containers it did not create.

use std::collections::HashMap;

/// Label key prefix reserved for this tool.
pub const PREFIX: &str = "io.berth.";

/// Marks an object as managed by this tool. Always `"true"`.
pub const MANAGED: &str = "io.berth.managed";

/// Project the object belongs to.
pub const PROJECT: &str = "io.berth.project";

/// Deploy version hash (containers only).
pub const VERSION: &str = "io.berth.version";

/// Public domain the container serves (containers only).
pub const DOMAIN: &str = "io.berth.domain";

/// Application port declared in the intent (containers only).
pub const PORT: &str = "io.berth.port";

/// Returns the full label set for a managed container.
pub fn labels_for(project: &str, version: &str, domain: &str, port: u16) -> HashMap<String, String> {
    HashMap::from([
        (MANAGED.to_string(), "true".to_string()),
        (PROJECT.to_string(), project.to_string()),
        (VERSION.to_string(), version.to_string()),
        (DOMAIN.to_string(), domain.to_string()),
        (PORT.to_string(), port.to_string()),
    ])
}

/// Returns the label set for a managed network.
pub fn network_labels(project: &str) -> HashMap<String, String> {
    HashMap::from([
        (MANAGED.to_string(), "true".to_string()),
        (PROJECT.to_string(), project.to_string()),
    ])
}

/// Predicate string selecting all managed objects.
pub fn managed_filter() -> String {
    format!("{MANAGED}=true")
}

/// Predicate string selecting one project's objects.
pub fn project_filter(project: &str) -> String {
    format!("{PROJECT}={project}")
}

/// Reads the project name back from a label map.
pub fn project_of(labels: &HashMap<String, String>) -> Option<&str> {
    labels.get(PROJECT).map(String::as_str)
}

/// Reads the version hash back from a label map.
pub fn version_of(labels: &HashMap<String, String>) -> Option<&str> {
    labels.get(VERSION).map(String::as_str)
}

/// Reads the domain back from a label map.
pub fn domain_of(labels: &HashMap<String, String>) -> Option<&str> {
    labels.get(DOMAIN).map(String::as_str)
}
