// src/runner.rs
use crate::error::QueryError;
use crate::executor::{Pass, PassOutcome};
use crate::query::{CompiledQuery, Query};
use crate::value::{LogRecord, OutputRecord, Results};
use crate::variables::{Scope, VariableStore};

/// Validate `query` and apply it to `records`, in order.
///
/// An invalid query is rejected before the first record is looked at.
pub fn run<I>(query: &Query, records: I) -> Result<Results, QueryError>
where
    I: IntoIterator<Item = LogRecord>,
{
    let compiled = query.compile()?;
    Ok(compiled.run(records))
}

impl CompiledQuery {
    /// Begin a run with a fresh persistent scope
    pub fn start(&self) -> QueryRun<'_> {
        QueryRun {
            query: self,
            variables: VariableStore::new(),
        }
    }

    pub fn run<I>(&self, records: I) -> Results
    where
        I: IntoIterator<Item = LogRecord>,
    {
        self.filter(records).collect()
    }

    /// Lazily apply the query to a record iterator, yielding emitted records
    pub fn filter<I>(&self, records: I) -> FilteredRecords<'_, I::IntoIter>
    where
        I: IntoIterator<Item = LogRecord>,
    {
        FilteredRecords {
            run: self.start(),
            records: records.into_iter(),
        }
    }
}

/// One run of a compiled query over a record stream.
///
/// Records must be fed in stream order; `lastVarValue` on a record sees
/// the bindings of the record fed just before it. Dropping a run between
/// records is always safe.
pub struct QueryRun<'q> {
    query: &'q CompiledQuery,
    variables: VariableStore,
}

impl<'q> QueryRun<'q> {
    /// Run one pass. `None` when the record was skipped.
    pub fn process(&mut self, record: LogRecord) -> Option<OutputRecord> {
        let result = Pass::new(&record, self.variables.persistent()).run(self.query.steps());
        self.variables.commit(&result.transient);

        match result.outcome {
            PassOutcome::Done => Some(OutputRecord {
                record,
                color: result.color,
                variables: result.transient.into_bindings(),
            }),
            PassOutcome::Skipped => None,
        }
    }

    /// Persistent scope as of the last processed record
    pub fn variables(&self) -> &Scope {
        self.variables.persistent()
    }
}

/// Iterator returned by [`CompiledQuery::filter`]
pub struct FilteredRecords<'q, I> {
    run: QueryRun<'q>,
    records: I,
}

impl<'q, I> Iterator for FilteredRecords<'q, I>
where
    I: Iterator<Item = LogRecord>,
{
    type Item = OutputRecord;

    fn next(&mut self) -> Option<OutputRecord> {
        for record in self.records.by_ref() {
            if let Some(output) = self.run.process(record) {
                return Some(output);
            }
        }
        None
    }
}
