//! Arrow table views of analysis output, used for tabular display.

/// Tables over classified clauses and missing-clause records.
pub mod clauses {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, BooleanArray, StringArray, UInt8Array, UInt32Array};
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;

    use crate::catalog::{RuleCatalog, RuleKind};
    use crate::model::{ClassifiedClause, MissingClause};

    /// One row per segmented clause.
    pub fn clause_table_schema() -> Schema {
        Schema::new(vec![
            Field::new("index", DataType::UInt32, false),
            Field::new("clause_type", DataType::Utf8, true),
            Field::new("risk_level", DataType::Utf8, true),
            Field::new("risk_score", DataType::UInt8, true),
            Field::new("status", DataType::Utf8, false),
            Field::new("statutory_reference", DataType::Utf8, true),
            Field::new("text", DataType::Utf8, false),
        ])
    }

    /// One row per required clause type absent from a document.
    pub fn missing_clause_schema() -> Schema {
        Schema::new(vec![
            Field::new("clause_type", DataType::Utf8, false),
            Field::new("critical", DataType::Boolean, false),
            Field::new("reason", DataType::Utf8, false),
            Field::new("suggested_text", DataType::Utf8, false),
        ])
    }

    /// One row per catalog rule, in evaluation order.
    pub fn rule_table_schema() -> Schema {
        Schema::new(vec![
            Field::new("type_id", DataType::Utf8, false),
            Field::new("display_name", DataType::Utf8, false),
            Field::new("kind", DataType::Utf8, false),
            Field::new("base_risk_score", DataType::UInt8, false),
            Field::new("required", DataType::Boolean, false),
            Field::new("statutory_reference", DataType::Utf8, false),
        ])
    }

    pub fn clauses_to_batch(clauses: &[ClassifiedClause]) -> Result<RecordBatch, ArrowError> {
        let schema: SchemaRef = Arc::new(clause_table_schema());

        let index = UInt32Array::from(
            clauses
                .iter()
                .map(|c| u32::try_from(c.clause.index).unwrap_or(u32::MAX))
                .collect::<Vec<_>>(),
        );
        let clause_type = StringArray::from(
            clauses
                .iter()
                .map(|c| c.matched_rule.as_ref().map(|m| m.clause_type.as_str()))
                .collect::<Vec<_>>(),
        );
        let risk_level = StringArray::from(
            clauses
                .iter()
                .map(|c| c.risk_level.map(|l| l.as_str()))
                .collect::<Vec<_>>(),
        );
        let risk_score = UInt8Array::from(clauses.iter().map(|c| c.risk_score()).collect::<Vec<_>>());
        let status = StringArray::from(
            clauses
                .iter()
                .map(|c| c.status.as_str())
                .collect::<Vec<_>>(),
        );
        let reference = StringArray::from(
            clauses
                .iter()
                .map(|c| {
                    c.matched_rule
                        .as_ref()
                        .map(|m| m.statutory_reference.as_str())
                })
                .collect::<Vec<_>>(),
        );
        let text = StringArray::from(
            clauses
                .iter()
                .map(|c| c.clause.text.as_str())
                .collect::<Vec<_>>(),
        );

        let columns: Vec<ArrayRef> = vec![
            Arc::new(index),
            Arc::new(clause_type),
            Arc::new(risk_level),
            Arc::new(risk_score),
            Arc::new(status),
            Arc::new(reference),
            Arc::new(text),
        ];
        RecordBatch::try_new(schema, columns)
    }

    pub fn missing_to_batch(missing: &[MissingClause]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(
                missing.iter().map(|m| m.clause_type.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(BooleanArray::from(
                missing.iter().map(|m| m.critical).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                missing.iter().map(|m| m.reason.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                missing
                    .iter()
                    .map(|m| m.suggested_text.as_str())
                    .collect::<Vec<_>>(),
            )),
        ];
        RecordBatch::try_new(Arc::new(missing_clause_schema()), columns)
    }

    pub fn rules_to_batch(catalog: &RuleCatalog) -> Result<RecordBatch, ArrowError> {
        let rules = catalog.rules();
        let kind = |k: RuleKind| match k {
            RuleKind::Risk => "risk",
            RuleKind::Standard => "standard",
        };
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(
                rules.iter().map(|r| r.type_id()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rules.iter().map(|r| r.display_name()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rules.iter().map(|r| kind(r.kind())).collect::<Vec<_>>(),
            )),
            Arc::new(UInt8Array::from(
                rules.iter().map(|r| r.base_risk_score()).collect::<Vec<_>>(),
            )),
            Arc::new(BooleanArray::from(
                rules.iter().map(|r| r.is_required()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rules
                    .iter()
                    .map(|r| r.spec.statutory_reference.as_str())
                    .collect::<Vec<_>>(),
            )),
        ];
        RecordBatch::try_new(Arc::new(rule_table_schema()), columns)
    }
}
