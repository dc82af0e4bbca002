use crate::operation::OperationSpec;
use std::sync::Arc;

/// Apply `steps` to `file_name` in order.
///
/// Empty slots are skipped. The result depends only on the arguments, so this is safe
/// to call from any number of threads at once.
pub fn evaluate(file_name: &str, file_index: usize, steps: &[Option<OperationSpec>]) -> String {
    steps
        .iter()
        .flatten()
        .fold(file_name.to_string(), |name, op| op.perform(&name, file_index))
}

/// An ordered, user-editable list of operations.
///
/// A slot can be left unconfigured (for example while a front end is still collecting
/// its arguments); unconfigured slots keep their position but do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<Option<OperationSpec>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation, returning its index.
    pub fn push(&mut self, op: OperationSpec) -> usize {
        self.steps.push(Some(op));
        self.steps.len() - 1
    }

    /// Append an empty slot, returning its index.
    pub fn push_unconfigured(&mut self) -> usize {
        self.steps.push(None);
        self.steps.len() - 1
    }

    /// Fill or replace the operation at `index`. Returns false if out of range.
    pub fn configure(&mut self, index: usize, op: OperationSpec) -> bool {
        match self.steps.get_mut(index) {
            Some(slot) => {
                *slot = Some(op);
                true
            },
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Option<OperationSpec>> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Swap the step at `index` with the one before it. No-op on the first step.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.steps.len() {
            return false;
        }
        self.steps.swap(index - 1, index);
        true
    }

    /// Swap the step at `index` with the one after it. No-op on the last step.
    pub fn move_down(&mut self, index: usize) -> bool {
        match index.checked_add(1) {
            Some(next) if next < self.steps.len() => {
                self.steps.swap(index, next);
                true
            },
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn slots(&self) -> &[Option<OperationSpec>] {
        &self.steps
    }

    /// Configured operations in order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.steps.iter().flatten()
    }

    pub fn evaluate(&self, file_name: &str, file_index: usize) -> String {
        evaluate(file_name, file_index, &self.steps)
    }

    /// Immutable copy of the steps for handing to worker threads.
    pub(crate) fn snapshot(&self) -> Arc<[Option<OperationSpec>]> {
        self.steps.clone().into()
    }
}

impl FromIterator<OperationSpec> for Pipeline {
    fn from_iter<I: IntoIterator<Item = OperationSpec>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().map(Some).collect(),
        }
    }
}

impl From<Vec<OperationSpec>> for Pipeline {
    fn from(ops: Vec<OperationSpec>) -> Self {
        ops.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::CaseMode;

    #[test]
    fn test_empty_pipeline_is_identity() {
        assert_eq!(evaluate("a.txt", 3, &[]), "a.txt");
        assert_eq!(Pipeline::new().evaluate("a.txt", 0), "a.txt");
    }

    #[test]
    fn test_prefix_and_suffix_in_both_orders() {
        let forward: Pipeline = vec![OperationSpec::prefix("x"), OperationSpec::suffix("y")].into();
        let reverse: Pipeline = vec![OperationSpec::suffix("y"), OperationSpec::prefix("x")].into();
        assert_eq!(forward.evaluate("a.txt", 0), "xay.txt");
        assert_eq!(reverse.evaluate("a.txt", 0), "xay.txt");

        // A prefix moves a dotfile's dot off position 0, turning it into a separator.
        assert_eq!(forward.evaluate(".rc", 0), "xy.rc");
        assert_eq!(reverse.evaluate(".rc", 0), "x.rcy");
    }

    #[test]
    fn test_order_matters_when_steps_interact() {
        // Replacing a leading "x" only sees the prefix when the prefix runs first.
        let prefix = OperationSpec::prefix("x");
        let strip = OperationSpec::replace("^x", "");

        let forward: Pipeline = vec![prefix.clone(), strip.clone()].into();
        let reverse: Pipeline = vec![strip, prefix].into();

        assert_eq!(forward.evaluate("xa.txt", 0), "xa.txt");
        assert_eq!(reverse.evaluate("xa.txt", 0), "xa.txt");
        assert_eq!(forward.evaluate("b.txt", 0), "b.txt");
        assert_eq!(reverse.evaluate("b.txt", 0), "xb.txt");
    }

    #[test]
    fn test_extension_change_then_suffix() {
        let pipeline: Pipeline = vec![
            OperationSpec::change_extension("md"),
            OperationSpec::suffix("_<00>"),
            OperationSpec::change_case(CaseMode::Upper),
        ]
        .into();
        assert_eq!(pipeline.evaluate("notes.txt", 4), "NOTES_05.MD");
    }

    #[test]
    fn test_unconfigured_slots_are_skipped() {
        let mut pipeline = Pipeline::new();
        pipeline.push(OperationSpec::prefix("a_"));
        let empty = pipeline.push_unconfigured();
        pipeline.push(OperationSpec::suffix("_z"));

        assert_eq!(pipeline.evaluate("f.txt", 0), "a_f_z.txt");
        assert_eq!(pipeline.operations().count(), 2);

        assert!(pipeline.configure(empty, OperationSpec::RemoveExtension));
        assert_eq!(pipeline.evaluate("f.txt", 0), "a_f_z");
        assert!(!pipeline.configure(10, OperationSpec::RemoveExtension));
    }

    #[test]
    fn test_move_and_remove() {
        let mut pipeline: Pipeline = vec![
            OperationSpec::prefix("1"),
            OperationSpec::prefix("2"),
            OperationSpec::prefix("3"),
        ]
        .into();
        assert_eq!(pipeline.evaluate("f", 0), "321f");

        assert!(pipeline.move_up(2));
        assert_eq!(pipeline.evaluate("f", 0), "231f");

        assert!(pipeline.move_down(0));
        assert_eq!(pipeline.evaluate("f", 0), "213f");

        assert!(!pipeline.move_up(0));
        assert!(!pipeline.move_down(2));
        assert!(!pipeline.move_up(7));
        assert!(!pipeline.move_down(usize::MAX));

        assert_eq!(pipeline.remove(1), Some(Some(OperationSpec::prefix("1"))));
        assert_eq!(pipeline.remove(5), None);
        assert_eq!(pipeline.len(), 2);

        pipeline.clear();
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let pipeline: Pipeline = vec![
            OperationSpec::replace("(\\d+)", "#$1"),
            OperationSpec::insert(0, "<000:7>-"),
        ]
        .into();
        let first = pipeline.evaluate("track12.mp3", 2);
        for _ in 0..5 {
            assert_eq!(pipeline.evaluate("track12.mp3", 2), first);
        }
        assert_eq!(first, "009-track#12.mp3");
    }
}
