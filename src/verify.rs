//! Read-only inspection of an initialized engine.

use std::fmt;

use serde::Serialize;
use tcinit_kernel::{AdminClient, AdminError, ProvisioningPlan, RoleBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyOptions {
    /// Require the collection to hold no documents.
    pub expect_empty: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerifyReport {
    pub database: String,
    pub checks: Vec<Check>,
    pub document_count: Option<u64>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed)
    }

    fn push(&mut self, name: &'static str, passed: bool, detail: impl Into<String>) {
        self.checks.push(Check {
            name,
            passed,
            detail: detail.into(),
        });
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let status = if check.passed { "ok  " } else { "FAIL" };
            writeln!(f, "[{}] {}: {}", status, check.name, check.detail)?;
        }
        write!(
            f,
            "{}",
            if self.is_ok() {
                "verification passed"
            } else {
                "verification failed"
            }
        )
    }
}

/// Compare the engine's current state with `plan`. Nothing is modified.
pub async fn verify(
    admin: &dyn AdminClient,
    plan: &ProvisioningPlan,
    options: VerifyOptions,
) -> Result<VerifyReport, AdminError> {
    let mut report = VerifyReport {
        database: plan.database.clone(),
        checks: Vec::new(),
        document_count: None,
    };

    let username = &plan.principal.username;
    match admin.user_info(&plan.database, username).await? {
        Some(record) => {
            report.push("principal", true, format!("user '{}' exists", username));

            let expected: Vec<RoleBinding> =
                plan.expected_grants().iter().map(RoleBinding::from).collect();
            let passed = record.roles == expected;
            report.push("grants", passed, describe_roles(&record.roles));

            let foreign: Vec<&RoleBinding> = record
                .roles
                .iter()
                .filter(|binding| binding.database != plan.database)
                .collect();
            report.push(
                "scope",
                foreign.is_empty(),
                if foreign.is_empty() {
                    format!("grants limited to '{}'", plan.database)
                } else {
                    format!("grants outside '{}': {:?}", plan.database, foreign)
                },
            );
        }
        None => report.push("principal", false, format!("user '{}' not found", username)),
    }

    let collections = admin.collection_names(&plan.database).await?;
    if collections.iter().any(|name| name == &plan.collection) {
        report.push(
            "collection",
            true,
            format!("collection '{}' exists", plan.collection),
        );

        let count = admin
            .count_documents(&plan.database, &plan.collection)
            .await?;
        report.document_count = Some(count);
        if options.expect_empty {
            report.push("empty", count == 0, format!("{} documents", count));
        }
    } else {
        report.push(
            "collection",
            false,
            format!("collection '{}' not found", plan.collection),
        );
    }

    tracing::info!(ok = report.is_ok(), checks = report.checks.len(), "verification finished");

    Ok(report)
}

fn describe_roles(roles: &[RoleBinding]) -> String {
    if roles.is_empty() {
        return "no roles".to_string();
    }
    roles
        .iter()
        .map(|binding| format!("{}@{}", binding.role, binding.database))
        .collect::<Vec<_>>()
        .join(", ")
}
