use std::fmt;

use serde::Serialize;

#[derive(Serialize, Debug, Clone, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub roles_created: usize,
    pub channels_created: usize,
    /// Channels whose overwrite list was set.
    pub permissions_applied: usize,
    pub failures: Vec<ImportFailure>,
    pub skipped: Vec<SkippedEntity>,
}

#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub entity_name: String,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FailureStage {
    CreateRole,
    CreateCategory,
    CreateChannel,
    SkippedParentFailed,
    ApplyOverwrites,
    UnmappedSubject,
    MissingChannel,
}

/// An entity that was not created because one with the same name already exists.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntity {
    pub entity_name: String,
    pub kind: EntityKind,
}

#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Role,
    Category,
    Channel,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_at(&self, stage: FailureStage) -> impl Iterator<Item = &ImportFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    pub(crate) fn fail(&mut self, entity_name: &str, stage: FailureStage, reason: impl ToString) {
        self.failures.push(ImportFailure {
            entity_name: entity_name.to_owned(),
            stage,
            reason: reason.to_string(),
        });
    }

    pub(crate) fn skip(&mut self, entity_name: &str, kind: EntityKind) {
        self.skipped.push(SkippedEntity {
            entity_name: entity_name.to_owned(),
            kind,
        });
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::CreateRole => "create-role",
            FailureStage::CreateCategory => "create-category",
            FailureStage::CreateChannel => "create-channel",
            FailureStage::SkippedParentFailed => "skipped-parent-failed",
            FailureStage::ApplyOverwrites => "apply-overwrites",
            FailureStage::UnmappedSubject => "unmapped-subject",
            FailureStage::MissingChannel => "missing-channel",
        };

        f.write_str(s)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Roles created: {}", self.roles_created)?;
        writeln!(f, "Channels created: {}", self.channels_created)?;
        writeln!(f, "Permissions applied: {}", self.permissions_applied)?;

        if !self.skipped.is_empty() {
            writeln!(f, "Already present: {}", self.skipped.len())?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  {} [{}]: {}",
                    failure.entity_name, failure.stage, failure.reason
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&FailureStage::SkippedParentFailed).unwrap();
        assert_eq!(json, r#""skipped-parent-failed""#);
        assert_eq!(
            FailureStage::SkippedParentFailed.to_string(),
            "skipped-parent-failed"
        );
    }

    #[test]
    fn test_render() {
        let mut summary = ImportSummary {
            roles_created: 2,
            ..Default::default()
        };
        summary.fail("Events", FailureStage::CreateCategory, "Missing Access");

        let text = summary.to_string();
        assert!(text.contains("Roles created: 2"));
        assert!(text.contains("Events [create-category]: Missing Access"));
        assert!(!summary.is_clean());
    }
}
