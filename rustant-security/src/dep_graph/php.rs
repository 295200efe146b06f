//! PHP dependency parser (composer.lock).

use super::{DepEdge, DepNode, DependencyGraph};
use crate::error::DepGraphError;

/// Parse a composer.lock file and populate the dependency graph.
///
/// composer.lock is a JSON file with two main arrays:
/// - `packages`: production dependencies
/// - `packages-dev`: development-only dependencies
///
/// Each entry has `name`, `version`, and optionally `require` (a map of dependency name to
/// version constraint).
pub fn parse_composer_lock(
    content: &str,
    graph: &mut DependencyGraph,
) -> Result<(), DepGraphError> {
    let lock: serde_json::Value =
        serde_json::from_str(content).map_err(|e| DepGraphError::LockfileParse {
            file: "composer.lock".into(),
            message: e.to_string(),
        })?;

    let mut node_map = std::collections::HashMap::new();

    // First pass: add all nodes from both packages and packages-dev
    for (section, is_dev) in &[("packages", false), ("packages-dev", true)] {
        if let Some(packages) = lock.get(*section).and_then(|p| p.as_array()) {
            for pkg in packages {
                let name = pkg
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or("unknown")
                    .to_string();

                let version = pkg
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("0.0.0");

                // Strip leading "v" prefix if present (e.g., "v1.0.0" -> "1.0.0")
                let version = version.strip_prefix('v').unwrap_or(version).to_string();

                let source = pkg
                    .get("source")
                    .and_then(|s| s.get("url"))
                    .and_then(|u| u.as_str())
                    .map(|s| s.to_string());

                let license = pkg
                    .get("license")
                    .and_then(|l| l.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());

                let idx = graph.add_node(DepNode {
                    name: name.clone(),
                    version,
                    ecosystem: "packagist".into(),
                    is_direct: true,
                    is_dev: *is_dev,
                    license,
                    source,
                });

                node_map.insert(name, idx);
            }
        }
    }

    // Second pass: add edges from require fields
    for section in &["packages", "packages-dev"] {
        if let Some(packages) = lock.get(*section).and_then(|p| p.as_array()) {
            for pkg in packages {
                let name = pkg
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or("unknown")
                    .to_string();

                if let (Some(&from_idx), Some(require)) = (
                    node_map.get(&name),
                    pkg.get("require").and_then(|r| r.as_object()),
                ) {
                    for (dep_name, version_req) in require {
                        // Skip PHP platform requirements (php, ext-*)
                        if dep_name == "php"
                            || dep_name.starts_with("ext-")
                            || dep_name.starts_with("lib-")
                        {
                            continue;
                        }

                        let req = version_req.as_str().unwrap_or("*").to_string();

                        if let Some(&to_idx) = node_map.get(dep_name) {
                            graph.add_edge(
                                from_idx,
                                to_idx,
                                DepEdge {
                                    version_req: Some(req),
                                    optional: false,
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
