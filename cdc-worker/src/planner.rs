use std::num::NonZeroUsize;

/// One query covering a contiguous window of an entity's record Ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow<'a> {
    pub ids: &'a [String],
    pub soql: String,
}

/// Splits an entity's quoted record Ids into windows of at most `batch_size` Ids and builds one
/// SOQL query per window, selecting every field in `fields`.
#[derive(Debug)]
pub struct BatchQueryPlanner<'a> {
    entity_name: &'a str,
    select_list: String,
    ids: &'a [String],
    batch_size: NonZeroUsize,
}

impl<'a> BatchQueryPlanner<'a> {
    pub fn new(
        entity_name: &'a str,
        fields: &[String],
        ids: &'a [String],
        batch_size: NonZeroUsize,
    ) -> Self {
        Self {
            entity_name,
            select_list: fields.join(","),
            ids,
            batch_size,
        }
    }

    /// Number of windows `windows` yields: `ceil(ids / batch_size)`.
    pub fn window_count(&self) -> usize {
        self.ids.len().div_ceil(self.batch_size.get())
    }

    /// Lazily build the query of every window, in record Id order. No Ids, no windows.
    pub fn windows(&self) -> impl Iterator<Item = QueryWindow<'a>> + '_ {
        self.ids
            .chunks(self.batch_size.get())
            .map(move |ids| QueryWindow {
                ids,
                soql: format!(
                    "SELECT {} FROM {} WHERE Id IN ({})",
                    self.select_list,
                    self.entity_name,
                    ids.join(",")
                ),
            })
    }
}
