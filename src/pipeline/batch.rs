//! Batch pipeline
//!
//! Compiles several declarative queries into one transaction and maps the
//! transport's answers back to them by position.
//!
//! Cycle (strict order):
//! 1. Build each plan (rejects invalid queries)
//! 2. Optimize each plan, unless disabled
//! 3. Render statements sequentially into one shared parameter bag
//! 4. Send the whole transaction in one transport call
//! 5. Assemble result `i` with query `i`

use serde_json::Value;

use super::config::CompilerConfig;
use super::errors::{PipelineError, PipelineResult};
use super::transport::Transport;
use crate::assembler::ResultAssembler;
use crate::compiler::{ParamBag, QueryCompiler};
use crate::observability::{log_event, Event};
use crate::optimizer::QueryOptimizer;
use crate::planner::{ExplainPlan, LogicalQuery, LogicalQueryBuilder, PlannerResult, Query};
use crate::schema::Schema;

/// Rendered statements of one batch and their shared parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBatch {
    statements: Vec<String>,
    params: ParamBag,
}

impl CompiledBatch {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// `BEGIN TRANSACTION; q1; ...; COMMIT TRANSACTION;`
    pub fn text(&self) -> String {
        let mut out = String::from("BEGIN TRANSACTION;");
        for statement in &self.statements {
            out.push(' ');
            out.push_str(statement);
            out.push(';');
        }
        out.push_str(" COMMIT TRANSACTION;");
        out
    }
}

/// Plans, compiles, runs and assembles batches of queries
#[derive(Debug, Clone, Copy)]
pub struct QueryPipeline<'a> {
    schema: &'a Schema,
    config: CompilerConfig,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Builds one plan and optimizes it when enabled
    pub fn plan(&self, query: &Query) -> PlannerResult<LogicalQuery> {
        let built = LogicalQueryBuilder::new(self.schema)
            .with_metadata(self.config.metadata)
            .build(query);
        let plan = match built {
            Ok(plan) => plan,
            Err(e) => {
                log_event(
                    Event::QueryRejected,
                    &[("code", e.code().code()), ("thing", query.thing.as_str())],
                );
                return Err(e);
            }
        };
        log_event(
            Event::QueryPlanned,
            &[
                ("access_path", plan.source.access_path()),
                ("cardinality", plan.cardinality.as_str()),
                ("thing", plan.thing.as_str()),
            ],
        );

        if !self.config.optimize {
            return Ok(plan);
        }
        let optimized = QueryOptimizer::new(self.schema).optimize(&plan);
        log_event(
            Event::QueryOptimized,
            &[
                ("after", optimized.source.access_path()),
                ("before", plan.source.access_path()),
                ("thing", plan.thing.as_str()),
            ],
        );
        Ok(optimized)
    }

    /// Explain output for one query, accepted or rejected
    pub fn explain(&self, query: &Query) -> ExplainPlan {
        match self.plan(query) {
            Ok(plan) => ExplainPlan::from_query(&plan),
            Err(e) => ExplainPlan::from_error(&e),
        }
    }

    /// Renders every query into one batch sharing one parameter bag
    pub fn compile(&self, queries: &[Query]) -> PipelineResult<CompiledBatch> {
        // Step 1-2: Plan everything before rendering anything
        let plans = queries
            .iter()
            .map(|q| self.plan(q))
            .collect::<PlannerResult<Vec<_>>>()?;

        // Step 3: Render in order into one bag
        let mut params = ParamBag::new();
        let statements: Vec<String> = plans
            .iter()
            .map(|plan| QueryCompiler::compile(plan, &mut params))
            .collect();

        let batch = CompiledBatch { statements, params };
        let param_count = batch.params.len().to_string();
        let statement_count = batch.len().to_string();
        log_event(
            Event::BatchCompiled,
            &[
                ("params", param_count.as_str()),
                ("statements", statement_count.as_str()),
            ],
        );
        Ok(batch)
    }

    /// Shapes raw results, correlated to queries by position
    pub fn assemble(&self, raw: &[Value], queries: &[Query]) -> PipelineResult<Vec<Value>> {
        if raw.len() != queries.len() {
            return Err(PipelineError::ResultCountMismatch {
                expected: queries.len(),
                actual: raw.len(),
            });
        }
        let assembler = ResultAssembler::new(self.schema)
            .with_metadata(self.config.metadata)
            .with_return_nulls(self.config.return_nulls);
        raw.iter()
            .zip(queries)
            .map(|(rows, query)| assembler.assemble(rows, query).map_err(PipelineError::from))
            .collect()
    }

    /// Compiles, executes in one round trip and assembles every query
    pub fn run<T: Transport + ?Sized>(
        &self,
        queries: &[Query],
        transport: &T,
    ) -> PipelineResult<Vec<Value>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.compile(queries)?;

        // Step 4: One round trip
        let raw = match transport.execute(&batch.text(), batch.params()) {
            Ok(raw) => raw,
            Err(e) => {
                let message = e.to_string();
                log_event(Event::BatchFailed, &[("error", message.as_str())]);
                return Err(e.into());
            }
        };
        let result_count = raw.len().to_string();
        let statement_count = batch.len().to_string();
        log_event(
            Event::BatchExecuted,
            &[
                ("results", result_count.as_str()),
                ("statements", statement_count.as_str()),
            ],
        );

        // Step 5: Assemble by position
        self.assemble(&raw, queries).inspect_err(|e| {
            log_event(Event::BatchFailed, &[("code", e.code())]);
        })
    }
}
