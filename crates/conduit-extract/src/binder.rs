//! Merging request sources into one typed value.

use crate::bound::{Bound, Fields};
use crate::context::ExtractionContext;
use crate::error::{ExtractionError, ExtractionSource};
use conduit_core::BinderRule;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Binds a request into `T` according to `rule`.
///
/// Sources are merged field by field before `T` is deserialized:
///
/// 1. the JSON body (rules that read it), which must be an object;
/// 2. query values, for fields the body did not set;
/// 3. path variables, percent-decoded, replacing anything already set.
///
/// An empty body is treated as absent. Repeated query keys bind to sequence
/// fields, and an empty query value binds to `None`.
pub fn bind<T: DeserializeOwned>(rule: BinderRule, ctx: &ExtractionContext) -> Result<T, ExtractionError> {
    let mut fields = Fields::default();

    if rule.reads_body() {
        merge_body(&mut fields, ctx)?;
    }
    merge_query(&mut fields, ctx)?;
    if rule.reads_path() {
        merge_path(&mut fields, ctx)?;
    }

    T::deserialize(fields).map_err(|err| err.into_extraction_error())
}

fn merge_body(fields: &mut Fields, ctx: &ExtractionContext) -> Result<(), ExtractionError> {
    if ctx.is_body_empty() {
        return Ok(());
    }

    let value: Value = serde_json::from_slice(ctx.body())
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e))?;
    let Value::Object(members) = value else {
        return Err(ExtractionError::deserialization_failed(
            ExtractionSource::Body,
            "expected a JSON object",
        ));
    };

    for (name, value) in members {
        fields.set(name, ExtractionSource::Body, Bound::Json(value));
    }
    Ok(())
}

fn merge_query(fields: &mut Fields, ctx: &ExtractionContext) -> Result<(), ExtractionError> {
    let Some(query) = ctx.query_string() else {
        return Ok(());
    };

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e))?;

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (name, value) in pairs {
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => grouped.push((name, vec![value])),
        }
    }

    for (name, mut values) in grouped {
        let bound = if values.len() == 1 {
            Bound::Text(values.remove(0))
        } else {
            Bound::List(values)
        };
        fields.set_if_absent(name, ExtractionSource::Query, bound);
    }
    Ok(())
}

fn merge_path(fields: &mut Fields, ctx: &ExtractionContext) -> Result<(), ExtractionError> {
    for (name, raw) in ctx.path_params().iter() {
        let decoded = urlencoding::decode(raw)
            .map_err(|e| ExtractionError::invalid_type(ExtractionSource::Path, name, e.to_string()))?;
        fields.set(
            name.to_string(),
            ExtractionSource::Path,
            Bound::Text(decoded.into_owned()),
        );
    }
    Ok(())
}
