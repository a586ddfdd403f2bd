pub use crate::config::*;

/// A builder for collecting the records of both sides.
///
/// ```
/// pub use label_matching::builder::Builder;
/// pub use label_matching::MatchRules;
/// # use label_matching::MatchingErrors;
///
/// let mut builder = Builder::new(&MatchRules::DEFAULT_RULES)?;
///
/// builder.add_backend("溝通不足", 2.1, Some(10))?;
/// builder.add_teacher("溝通不佳", 2.0)?;
///
/// let rec = builder.reconcile()?;
/// // 3 characters out of 4 in common: 75, under the default threshold.
/// assert!(rec.fuzzy_suggestions.is_empty());
///
/// # Ok::<(), MatchingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: MatchRules,
    pub(crate) _backend: Vec<LabeledValue>,
    pub(crate) _teacher: Vec<LabeledValue>,
}

impl Builder {
    pub fn new(rules: &MatchRules) -> Result<Builder, MatchingErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _backend: Vec::new(),
            _teacher: Vec::new(),
        })
    }

    /// Adds a backend question with its mean and, if known, its sample count.
    pub fn add_backend(
        &mut self,
        text: &str,
        mean: f64,
        n: Option<u64>,
    ) -> Result<(), MatchingErrors> {
        self.add_value(Side::Backend, LabeledValue::backend(text, mean, n))
    }

    /// Adds a teacher question with its mean.
    pub fn add_teacher(&mut self, text: &str, mean: f64) -> Result<(), MatchingErrors> {
        self.add_value(Side::Teacher, LabeledValue::teacher(text, mean))
    }

    /// Adds a record that was already built.
    ///
    /// Means that are not finite numbers are refused: they cannot come out of
    /// the numeric coercion of the loaders.
    pub fn add_value(&mut self, side: Side, value: LabeledValue) -> Result<(), MatchingErrors> {
        if !value.mean().is_finite() {
            return Err(MatchingErrors::NonFiniteMean {
                side,
                text: value.original_text().to_string(),
            });
        }
        match side {
            Side::Backend => self._backend.push(value),
            Side::Teacher => self._teacher.push(value),
        }
        Ok(())
    }

    pub fn backend(&self) -> &[LabeledValue] {
        &self._backend
    }

    pub fn teacher(&self) -> &[LabeledValue] {
        &self._teacher
    }

    pub fn reconcile(&self) -> Result<Reconciliation, MatchingErrors> {
        crate::reconcile(&self._backend, &self._teacher, &self._rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_bad_rules() {
        let rules = MatchRules {
            fuzzy_threshold: 120,
            ..MatchRules::DEFAULT_RULES
        };
        assert!(matches!(
            Builder::new(&rules),
            Err(MatchingErrors::InvalidThreshold(120))
        ));
    }

    #[test]
    fn builder_rejects_nan_means() {
        let mut builder = Builder::new(&MatchRules::DEFAULT_RULES).unwrap();
        assert_eq!(
            builder.add_teacher("Q1", f64::NAN),
            Err(MatchingErrors::NonFiniteMean {
                side: Side::Teacher,
                text: "Q1".to_string()
            })
        );
        assert!(builder.teacher().is_empty());
    }

    #[test]
    fn builder_keeps_sides_apart() {
        let mut builder = Builder::new(&MatchRules::DEFAULT_RULES).unwrap();
        builder.add_backend("Q1", 1.0, Some(3)).unwrap();
        builder.add_backend("Q2", 2.0, None).unwrap();
        builder.add_teacher("q1", 1.5).unwrap();
        assert_eq!(builder.backend().len(), 2);
        assert_eq!(builder.teacher().len(), 1);
        let rec = builder.reconcile().unwrap();
        assert_eq!(rec.exact_matches.len(), 1);
        assert_eq!(rec.exact_matches[0].backend_n, Some(3));
        assert_eq!(rec.backend_unmatched.len(), 1);
    }
}
