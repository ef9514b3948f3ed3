use log::{debug, info, warn};
use std::collections::HashSet;

use crate::config::*;

/// A column of the survey table, resolved once by name.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ColumnHandle {
    pub index: usize,
    pub name: String,
}

/// An interviewer role with both its id and its name column present.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolvedRole {
    /// The name column with the name suffix stripped.
    pub prefix: String,
    pub id_column: ColumnHandle,
    pub name_column: ColumnHandle,
}

/// The column sets of a survey table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolvedSchema {
    pub respondent_id: ColumnHandle,
    pub start_time: ColumnHandle,
    pub end_time: ColumnHandle,
    /// All interviewer-id columns, in header order.
    pub id_columns: Vec<ColumnHandle>,
    /// All interviewer-name columns, in header order.
    pub name_columns: Vec<ColumnHandle>,
    /// The paired roles, in the order of their name columns.
    pub roles: Vec<ResolvedRole>,
    pub excluded_roles: Vec<RoleExclusion>,
    pub question_columns: Vec<ColumnHandle>,
}

fn required_column(headers: &[String], name: &str) -> Result<ColumnHandle, PipelineError> {
    headers
        .iter()
        .position(|h| h == name)
        .map(|index| ColumnHandle {
            index,
            name: name.to_string(),
        })
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}

fn matching_columns(headers: &[String], prefixes: &[String], suffix: &str) -> Vec<ColumnHandle> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| prefixes.iter().any(|p| h.starts_with(p.as_str())) && h.ends_with(suffix))
        .map(|(index, h)| ColumnHandle {
            index,
            name: h.clone(),
        })
        .collect()
}

/// Resolves the column sets of a table from its header alone.
///
/// A name column `<p><name suffix>` is paired with the id column
/// `<p><id suffix>`. Name columns without that id column, and id columns
/// without a name column, are reported in `excluded_roles` and take no part
/// in the reshape.
pub fn resolve_schema(
    headers: &[String],
    rules: &PipelineRules,
) -> Result<ResolvedSchema, PipelineError> {
    let respondent_id = required_column(headers, &rules.columns.respondent_id)?;
    let start_time = required_column(headers, &rules.columns.start_time)?;
    let end_time = required_column(headers, &rules.columns.end_time)?;

    let role_cols = &rules.roles;
    let name_columns = matching_columns(headers, &role_cols.prefixes, &role_cols.name_suffix);
    let id_columns = matching_columns(headers, &role_cols.prefixes, &role_cols.id_suffix);
    debug!(
        "resolve_schema: name columns: {:?} id columns: {:?}",
        name_columns, id_columns
    );

    let mut roles: Vec<ResolvedRole> = Vec::new();
    let mut excluded_roles: Vec<RoleExclusion> = Vec::new();
    for name_column in name_columns.iter() {
        let prefix = name_column
            .name
            .strip_suffix(role_cols.name_suffix.as_str())
            .unwrap_or(name_column.name.as_str())
            .to_string();
        let expected_id = format!("{}{}", prefix, role_cols.id_suffix);
        match id_columns.iter().find(|c| c.name == expected_id) {
            Some(id_column) => roles.push(ResolvedRole {
                prefix,
                id_column: id_column.clone(),
                name_column: name_column.clone(),
            }),
            None => {
                warn!(
                    "Role {:?}: no column {:?} for the names in {:?}, the role is skipped",
                    prefix, expected_id, name_column.name
                );
                excluded_roles.push(RoleExclusion::MissingIdColumn {
                    prefix,
                    name_column: name_column.name.clone(),
                });
            }
        }
    }
    for id_column in id_columns.iter() {
        if !roles.iter().any(|r| r.id_column == *id_column) {
            let prefix = id_column
                .name
                .strip_suffix(role_cols.id_suffix.as_str())
                .unwrap_or(id_column.name.as_str())
                .to_string();
            warn!(
                "Role {:?}: no interviewer name column for {:?}, the role is skipped",
                prefix, id_column.name
            );
            excluded_roles.push(RoleExclusion::MissingNameColumn {
                prefix,
                id_column: id_column.name.clone(),
            });
        }
    }

    let mut excluded: HashSet<&str> = HashSet::new();
    excluded.insert(rules.columns.respondent_id.as_str());
    excluded.insert(rules.columns.start_time.as_str());
    excluded.insert(rules.columns.end_time.as_str());
    excluded.extend(DERIVED_COLUMNS.iter().copied());
    excluded.extend(name_columns.iter().map(|c| c.name.as_str()));
    excluded.extend(id_columns.iter().map(|c| c.name.as_str()));

    let question_columns: Vec<ColumnHandle> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !excluded.contains(h.as_str()))
        .map(|(index, h)| ColumnHandle {
            index,
            name: h.clone(),
        })
        .collect();

    info!(
        "Resolved {} interviewer roles {:?} and {} question columns",
        roles.len(),
        roles.iter().map(|r| r.prefix.as_str()).collect::<Vec<&str>>(),
        question_columns.len()
    );

    Ok(ResolvedSchema {
        respondent_id,
        start_time,
        end_time,
        id_columns,
        name_columns,
        roles,
        excluded_roles,
        question_columns,
    })
}
