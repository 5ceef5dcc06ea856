//! Course completion wiring for imported page activities.

use coursesync_core::{
    AggregationMethod, AggregationRule, Backend, BackendError, CompletionCriterion, CourseId,
    CriteriaType, ModuleId,
};

/// What [`CompletionWirer::wire`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    AlreadyWired,
    Wired,
}

/// Makes viewing an activity complete its course.
#[derive(Debug, Clone)]
pub struct CompletionWirer {
    module_type: String,
}

impl Default for CompletionWirer {
    fn default() -> Self {
        Self {
            module_type: "page".to_string(),
        }
    }
}

impl CompletionWirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the activity criterion for `(course, module)` and require all
    /// criteria of every type. Calling it again for a wired pair changes
    /// nothing.
    pub fn wire<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Wiring, BackendError> {
        let criterion = backend.find_completion_criterion(course, module)?;
        let overall = backend.find_aggregation_rule(course, CriteriaType::Overall)?;
        if criterion.is_some()
            && overall.is_some_and(|rule| rule.method == AggregationMethod::All)
        {
            return Ok(Wiring::AlreadyWired);
        }

        if criterion.is_none() {
            backend.save_completion_criterion(&CompletionCriterion {
                course,
                module,
                module_type: self.module_type.clone(),
            })?;
        }

        for criteria_type in CriteriaType::ALL {
            let current = backend.find_aggregation_rule(course, criteria_type)?;
            if current.is_some_and(|rule| rule.method == AggregationMethod::All) {
                continue;
            }
            backend.save_aggregation_rule(&AggregationRule {
                course,
                criteria_type,
                method: AggregationMethod::All,
            })?;
        }

        tracing::debug!(course, module, "completion wired");
        Ok(Wiring::Wired)
    }
}
