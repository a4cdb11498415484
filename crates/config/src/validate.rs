// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-reference validation over a parsed configuration.

use crate::model::{Config, JobKind};
use crate::ConfigError;
use std::collections::HashSet;

/// Validate name uniqueness and cross-references. Collects every problem
/// instead of stopping at the first so `configtest` can report them all.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    check_unique(
        config.sources.iter().map(|s| s.name.as_str()),
        "source",
        &mut errors,
    );
    check_unique(
        config.storages.iter().map(|s| s.name.as_str()),
        "storage",
        &mut errors,
    );
    check_unique(
        config.jobs.iter().map(|j| j.name.as_str()),
        "job",
        &mut errors,
    );

    let source_names: HashSet<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
    let storage_names: HashSet<&str> = config.storages.iter().map(|s| s.name.as_str()).collect();

    for job in &config.jobs {
        if !storage_names.contains(job.dest.as_str()) {
            errors.push(format!(
                "job \"{}\": unknown dest storage \"{}\"",
                job.name, job.dest
            ));
        }

        match job.kind {
            JobKind::Replication => match &job.replicate {
                None => errors.push(format!(
                    "job \"{}\": replication jobs require a \"replicate\" storage",
                    job.name
                )),
                Some(replicate) => {
                    if !storage_names.contains(replicate.as_str()) {
                        errors.push(format!(
                            "job \"{}\": unknown replicate storage \"{}\"",
                            job.name, replicate
                        ));
                    }
                    if replicate == &job.dest {
                        errors.push(format!(
                            "job \"{}\": cannot replicate a storage onto itself",
                            job.name
                        ));
                    }
                }
            },
            JobKind::Backup => {
                if job.replicate.is_some() {
                    errors.push(format!(
                        "job \"{}\": \"replicate\" is only valid for replication jobs",
                        job.name
                    ));
                }
            }
        }

        for name in job.limit.iter().chain(&job.exclude) {
            if !source_names.contains(name.as_str()) {
                errors.push(format!("job \"{}\": unknown source \"{}\"", job.name, name));
            }
        }

        if job.concurrency == 0 {
            errors.push(format!("job \"{}\": concurrency must be at least 1", job.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

fn check_unique<'a>(
    names: impl Iterator<Item = &'a str>,
    entity: &str,
    errors: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(format!("duplicate {} name \"{}\"", entity, name));
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
